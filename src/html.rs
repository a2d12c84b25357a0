use crate::node::{Element, Node};
use pulldown_cmark_escape::{escape_html, escape_html_body_text};
use std::fmt::Write as _;

pub fn element_to_html(element: &Element) -> String {
    let mut out = String::new();
    write_element(element, &mut out);
    out
}

/// Escapes `text` for use between tags.
pub fn text_to_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let _ = escape_html_body_text(&mut out, text);
    out
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Element(el) => write_element(el, out),
        Node::Text(value) => {
            let _ = escape_html_body_text(&mut *out, value);
        }
    }
}

fn write_element(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&element.tag);
    for (key, value) in &element.properties {
        let _ = write!(out, " {key}=\"");
        let _ = escape_html(&mut *out, value);
        out.push('"');
    }
    out.push('>');
    for child in &element.children {
        write_node(child, out);
    }
    let _ = write!(out, "</{}>", element.tag);
}
