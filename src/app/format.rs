use anyhow::Result;

/// A rich-text command handed to the host editing surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatCommand {
    Bold,
    Italic,
    Underline,
    StrikeThrough,
    CreateLink(String),
    InsertUnorderedList,
    InsertOrderedList,
    Blockquote,
}

impl FormatCommand {
    /// Command name understood by native rich-text surfaces.
    pub fn name(&self) -> &'static str {
        match self {
            FormatCommand::Bold => "bold",
            FormatCommand::Italic => "italic",
            FormatCommand::Underline => "underline",
            FormatCommand::StrikeThrough => "strikeThrough",
            FormatCommand::CreateLink(_) => "createLink",
            FormatCommand::InsertUnorderedList => "insertUnorderedList",
            FormatCommand::InsertOrderedList => "insertOrderedList",
            FormatCommand::Blockquote => "formatBlock",
        }
    }

    pub fn argument(&self) -> Option<&str> {
        match self {
            FormatCommand::CreateLink(url) => Some(url.as_str()),
            FormatCommand::Blockquote => Some("blockquote"),
            _ => None,
        }
    }
}

/// The host's editing surface. It owns the markup; the resulting content
/// comes back through the regular input path.
pub trait FormattingSurface {
    fn exec(&mut self, name: &str, argument: Option<&str>) -> Result<()>;
}
