//! Recursive DOM walk producing Markdown.

use ego_tree::NodeRef;
use scraper::{ElementRef, Node};
use url::Url;

use super::links::{classify_link, render_link};
use super::table::convert_table;

/// Stateless renderer configured once per document.
pub struct Renderer {
    /// Base for resolving relative hrefs (in-document `<base>` wins).
    resolve_base: Option<Url>,
    /// The site being archived; decides internal vs external links.
    site_base: Option<Url>,
    attachment_prefix: Option<String>,
}

impl Renderer {
    #[must_use]
    pub fn new(
        resolve_base: Option<Url>,
        site_base: Option<Url>,
        attachment_prefix: Option<String>,
    ) -> Self {
        Self {
            resolve_base,
            site_base,
            attachment_prefix,
        }
    }

    /// Render the children of `node` in block mode and trim the edges.
    #[must_use]
    pub fn render_fragment(&self, node: NodeRef<'_, Node>) -> String {
        let mut out = String::new();
        for child in node.children() {
            self.render_node(child, &mut out, 0);
        }
        out.trim().to_string()
    }

    fn render_node(&self, node: NodeRef<'_, Node>, out: &mut String, depth: usize) {
        match node.value() {
            Node::Text(text) => self.render_text(text, out),
            Node::Element(_) => {
                if let Some(el) = ElementRef::wrap(node) {
                    self.render_element(el, out, depth);
                }
            }
            _ => {}
        }
    }

    fn render_text(&self, text: &str, out: &mut String) {
        let collapsed = collapse_whitespace(text);
        if collapsed.is_empty() {
            return;
        }
        if collapsed == " " {
            // Lone whitespace only matters between two inline runs.
            if !out.is_empty() && !out.ends_with(char::is_whitespace) {
                out.push(' ');
            }
            return;
        }
        if out.ends_with('\n') {
            out.push_str(collapsed.trim_start());
        } else {
            out.push_str(&collapsed);
        }
    }

    fn render_element(&self, el: ElementRef<'_>, out: &mut String, depth: usize) {
        match el.value().name() {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = el.value().name().as_bytes()[1] - b'0';
                let text = self.render_inline(el);
                if !text.is_empty() {
                    block_sep(out);
                    for _ in 0..level {
                        out.push('#');
                    }
                    out.push(' ');
                    out.push_str(&text);
                    block_sep(out);
                }
            }
            "p" => {
                block_sep(out);
                self.render_children(el, out, depth);
                block_sep(out);
            }
            "br" => out.push('\n'),
            "hr" => {
                block_sep(out);
                out.push_str("---");
                block_sep(out);
            }
            "strong" | "b" => self.render_wrapped(el, "**", out),
            "em" | "i" => self.render_wrapped(el, "*", out),
            "del" | "s" | "strike" => self.render_wrapped(el, "~~", out),
            "code" => {
                // <pre><code> is handled by the pre branch.
                let parent_is_pre = el
                    .parent()
                    .and_then(ElementRef::wrap)
                    .is_some_and(|p| p.value().name() == "pre");
                if !parent_is_pre {
                    let text: String = el.text().collect();
                    let text = text.trim();
                    if !text.is_empty() {
                        out.push('`');
                        out.push_str(text);
                        out.push('`');
                    }
                }
            }
            "pre" => self.render_code_block(el, out),
            "blockquote" => self.render_blockquote(el, out, depth),
            "ul" => self.render_list(el, false, out, depth),
            "ol" => self.render_list(el, true, out, depth),
            "a" => self.render_anchor(el, out),
            "img" => self.render_image(el, out),
            "table" => {
                let rendered = convert_table(el, self);
                if !rendered.is_empty() {
                    block_sep(out);
                    out.push_str(rendered.trim_end());
                    block_sep(out);
                }
            }
            "dt" => {
                block_sep(out);
                self.render_wrapped(el, "**", out);
                block_sep(out);
            }
            "dd" => {
                block_sep(out);
                self.render_children(el, out, depth);
                block_sep(out);
            }
            "script" | "style" | "head" | "noscript" | "template" | "iframe" | "svg"
            | "button" | "input" | "select" | "form" => {}
            "div" | "section" | "article" | "main" | "aside" | "figure" | "figcaption"
            | "header" | "footer" | "nav" | "details" | "summary" | "body" | "html" => {
                // Transparent block containers: keep their content separated
                // from surrounding inline runs.
                block_sep(out);
                self.render_children(el, out, depth);
                block_sep(out);
            }
            _ => self.render_children(el, out, depth),
        }
    }

    fn render_children(&self, el: ElementRef<'_>, out: &mut String, depth: usize) {
        for child in el.children() {
            self.render_node(child, out, depth);
        }
    }

    /// Render children into a single-line string for inline contexts.
    fn render_inline(&self, el: ElementRef<'_>) -> String {
        let mut out = String::new();
        self.render_children(el, &mut out, 0);
        out.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn render_wrapped(&self, el: ElementRef<'_>, marker: &str, out: &mut String) {
        let inner = self.render_inline(el);
        if inner.is_empty() {
            return;
        }
        if !out.is_empty() && !out.ends_with(char::is_whitespace) {
            out.push(' ');
        }
        out.push_str(marker);
        out.push_str(&inner);
        out.push_str(marker);
    }

    fn render_code_block(&self, el: ElementRef<'_>, out: &mut String) {
        let code: String = el.text().collect();
        let code = code.trim_end();
        if code.trim().is_empty() {
            return;
        }

        // Language hint from <code class="language-..."> if present.
        let language = el
            .children()
            .filter_map(ElementRef::wrap)
            .find(|child| child.value().name() == "code")
            .and_then(|code_el| {
                code_el.value().classes().find_map(|class| {
                    class
                        .strip_prefix("language-")
                        .or_else(|| class.strip_prefix("lang-"))
                        .map(ToString::to_string)
                })
            })
            .unwrap_or_default();

        block_sep(out);
        out.push_str("```");
        out.push_str(&language);
        out.push('\n');
        out.push_str(code);
        out.push_str("\n```");
        block_sep(out);
    }

    fn render_blockquote(&self, el: ElementRef<'_>, out: &mut String, depth: usize) {
        let mut inner = String::new();
        self.render_children(el, &mut inner, depth);
        let inner = inner.trim();
        if inner.is_empty() {
            return;
        }

        block_sep(out);
        for (i, line) in inner.lines().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            if line.trim().is_empty() {
                out.push('>');
            } else {
                out.push_str("> ");
                out.push_str(line.trim_end());
            }
        }
        block_sep(out);
    }

    fn render_list(&self, el: ElementRef<'_>, ordered: bool, out: &mut String, depth: usize) {
        if depth == 0 {
            block_sep(out);
        }

        let mut index: usize = el
            .value()
            .attr("start")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1);

        for child in el.children().filter_map(ElementRef::wrap) {
            if child.value().name() != "li" {
                continue;
            }

            let mut item = String::new();
            let mut nested = String::new();
            for li_child in child.children() {
                let is_nested_list = li_child
                    .value()
                    .as_element()
                    .is_some_and(|e| matches!(e.name(), "ul" | "ol"));
                if is_nested_list {
                    if let Some(list_el) = ElementRef::wrap(li_child) {
                        self.render_list(
                            list_el,
                            list_el.value().name() == "ol",
                            &mut nested,
                            depth + 1,
                        );
                    }
                } else {
                    self.render_node(li_child, &mut item, depth);
                }
            }

            let item = item.split_whitespace().collect::<Vec<_>>().join(" ");
            for _ in 0..depth {
                out.push_str("  ");
            }
            if ordered {
                out.push_str(&format!("{index}. "));
                index += 1;
            } else {
                out.push_str("- ");
            }
            out.push_str(&item);
            out.push('\n');
            if !nested.is_empty() {
                out.push_str(nested.trim_matches('\n'));
                out.push('\n');
            }
        }

        if depth == 0 {
            out.push('\n');
        }
    }

    fn render_anchor(&self, el: ElementRef<'_>, out: &mut String) {
        let text = self.render_inline(el);
        let Some(href) = el.value().attr("href") else {
            out.push_str(&text);
            return;
        };

        match classify_link(href, self.resolve_base.as_ref(), self.site_base.as_ref()) {
            Some(target) => out.push_str(&render_link(&text, &target)),
            None => out.push_str(&text),
        }
    }

    fn render_image(&self, el: ElementRef<'_>, out: &mut String) {
        let Some(src) = el.value().attr("src") else {
            return;
        };
        if src.is_empty() {
            return;
        }
        let alt = el.value().attr("alt").unwrap_or("");

        // Images already relocated into the local attachments directory use
        // the embed form; everything else stays a standard image link.
        if let Some(prefix) = &self.attachment_prefix
            && src.starts_with(prefix.as_str())
        {
            out.push_str(&format!("![[{src}]]"));
            return;
        }

        let resolved = match &self.resolve_base {
            Some(base) => base
                .join(src)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| src.to_string()),
            None => src.to_string(),
        };
        out.push_str(&format!("![{alt}]({resolved})"));
    }
}

/// Ensure the output ends with exactly one blank line (block separation).
fn block_sep(out: &mut String) {
    while out.ends_with(' ') || out.ends_with('\t') {
        out.pop();
    }
    if out.is_empty() {
        return;
    }
    while out.ends_with('\n') {
        out.pop();
    }
    out.push_str("\n\n");
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_ws = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_ws {
                out.push(' ');
            }
            in_ws = true;
        } else {
            out.push(ch);
            in_ws = false;
        }
    }
    out
}
