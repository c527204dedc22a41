use crate::engine::classifier::ClassificationResult;
use crate::engine::staging::Attachment;

const CONTEXT_FILE_LIMIT: usize = 3;

/// Builds the final generation prompt. Returns an empty string for instant
/// replies, which callers treat as "do not submit".
pub fn augment(
    raw_query: &str,
    classification: &ClassificationResult,
    attachments: &[Attachment],
) -> String {
    if matches!(classification, ClassificationResult::InstantReply(_)) {
        return String::new();
    }

    let mut prompt = raw_query.to_string();

    if !attachments.is_empty() {
        let file_names = attachments
            .iter()
            .take(CONTEXT_FILE_LIMIT)
            .map(|attachment| attachment.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        prompt = format!(
            "{prompt}\n\nCONTEXT: Analyze these project files: {file_names}\nGenerate components compatible with them."
        );
    }

    if let Some(category) = classification.category() {
        prompt = format!(
            "Create a professional {category} component. {prompt}\nInclude: property controls, responsive design, smooth animations, best practices."
        );
    }

    prompt
}
