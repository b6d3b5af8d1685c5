use std::borrow::Cow;

use crate::config::MarkupPolicy;

/// Content as it should reach the store under `policy`.
pub fn prepare_content(policy: MarkupPolicy, content: &str) -> Cow<'_, str> {
    match policy {
        MarkupPolicy::Verbatim => Cow::Borrowed(content),
        MarkupPolicy::Sanitize => {
            let cleaned = ammonia::clean(content);
            if cleaned != content {
                tracing::debug!(
                    removed_bytes = content.len().saturating_sub(cleaned.len()),
                    "sanitized note markup"
                );
            }
            Cow::Owned(cleaned)
        }
    }
}
