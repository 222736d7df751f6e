use ammonia;

use crate::models::quiz::Question;

/// Strips dangerous markup from authored text, keeping safe formatting tags.
///
/// Question prompts and option texts are rendered as HTML by the participant
/// page, so every authored string that reaches it goes through here.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Sanitizes the displayable text of a question.
///
/// Answer keys are left untouched: they are compared verbatim against
/// submissions.
pub fn clean_question(mut question: Question) -> Question {
    question.question = clean_html(&question.question);
    if let Some(options) = question.options.as_mut() {
        for text in options.values_mut() {
            *text = clean_html(text);
        }
    }
    question.explanation = question.explanation.as_deref().map(clean_html);
    question
}
