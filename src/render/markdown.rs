//! Markdown to HTML conversion for the `formatted_body` of Matrix messages.

use comrak::Options;

/// GitHub Flavored Markdown options used for every message.
///
/// Bare URLs are linked, since templates routinely print `{{.Repository.Url}}`.
/// Raw HTML in the template output is omitted rather than passed through.
fn options() -> Options<'static> {
    let mut options = Options::default();

    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;

    options.parse.smart = true;

    options
}

/// Renders markdown text as an HTML fragment.
pub fn markdown_to_html(text: &str) -> String {
    comrak::markdown_to_html(text, &options())
}
