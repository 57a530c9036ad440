/// Default answering prompt: an R expert persona over retrieved package context.
pub const R_EXPERT_TEMPLATE: &str = "You are an expert R programmer and data scientist. \
Use the provided context about R packages to answer the user's question. \
The context includes both documentation and code from various R packages.

Context:
{context}

Question:
{question}

Answer:";

/// Template with `{context}` and `{question}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self { template: R_EXPERT_TEMPLATE.to_string() }
    }
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self { template: template.into() }
    }

    /// Substitute both placeholders in one pass, so braces inside the
    /// context or question are never re-expanded.
    pub fn render(&self, context: &str, question: &str) -> String {
        let mut out = String::with_capacity(self.template.len() + context.len() + question.len());
        let mut rest = self.template.as_str();
        while let Some(pos) = rest.find('{') {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];
            if let Some(after) = tail.strip_prefix("{context}") {
                out.push_str(context);
                rest = after;
            } else if let Some(after) = tail.strip_prefix("{question}") {
                out.push_str(question);
                rest = after;
            } else {
                out.push('{');
                rest = &tail[1..];
            }
        }
        out.push_str(rest);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_both_placeholders() {
        let p = PromptTemplate::new("C={context}; Q={question}").render("ctx", "why?");
        assert_eq!(p, "C=ctx; Q=why?");
    }

    #[test]
    fn does_not_expand_placeholders_inside_values() {
        let p = PromptTemplate::new("{context}|{question}").render("{question}", "q");
        assert_eq!(p, "{question}|q");
    }

    #[test]
    fn default_template_mentions_r() {
        let p = PromptTemplate::default().render("CTX", "QQ");
        assert!(p.starts_with("You are an expert R programmer"));
        assert!(p.contains("Context:\nCTX\n\nQuestion:\nQQ\n\nAnswer:"));
    }
}
