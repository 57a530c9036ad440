use crate::merge::WeightedHit;

/// `[Source: … | Type: …]` header followed by the chunk text, one block per
/// hit, blocks separated by a blank line.
pub fn format_context(hits: &[WeightedHit]) -> String {
    hits.iter()
        .map(|h| format!("[Source: {} | Type: {}]\n{}", h.chunk.source, h.chunk.file_type, h.chunk.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}
