use anyhow::Result;
use std::io::{BufRead, Write};

use crate::session::QuestionAnswerer;

/// Read questions line by line until `exit` (any case) or end of input.
///
/// Errors from the answerer are printed and the loop continues; only I/O
/// errors on `input`/`output` end it early.
pub async fn run_interactive<A, R, W>(answerer: &A, input: R, output: &mut W) -> Result<()>
where
    A: QuestionAnswerer + ?Sized,
    R: BufRead,
    W: Write,
{
    writeln!(output, "R Package RAG System - Interactive Mode (powered by {})", answerer.model_name())?;
    writeln!(output, "Type 'exit' to quit")?;
    let mut lines = input.lines();
    loop {
        write!(output, "\nEnter your question: ")?;
        output.flush()?;
        let Some(line) = lines.next() else {
            writeln!(output)?;
            break;
        };
        let line = line?;
        let question = line.trim();
        if question.eq_ignore_ascii_case("exit") {
            break;
        }
        if question.is_empty() {
            continue;
        }
        match answerer.answer(question).await {
            Ok(answer) => writeln!(output, "\nAnswer:\n{}", answer)?,
            Err(e) => writeln!(output, "Error: {:#}", e)?,
        }
    }
    Ok(())
}
