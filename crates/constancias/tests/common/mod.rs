//! PDF inspection helpers shared by the integration tests

#![allow(dead_code)]

use lopdf::content::Content;
use lopdf::{Document, Object};

/// One decoded content stream operation
pub type Op = (String, Vec<Object>);

/// Decode the content stream of the only page
pub fn page_operations(pdf: &[u8]) -> Vec<Op> {
    let doc = Document::load_mem(pdf).unwrap();
    let page_id = doc.get_pages()[&1];
    let content = doc.get_page_content(page_id).unwrap();
    Content::decode(&content)
        .unwrap()
        .operations
        .into_iter()
        .map(|op| (op.operator, op.operands))
        .collect()
}

pub fn number(obj: &Object) -> f64 {
    match obj {
        Object::Integer(i) => *i as f64,
        Object::Real(r) => *r as f64,
        other => panic!("not a number: {other:?}"),
    }
}

pub fn numbers(operands: &[Object]) -> Vec<f64> {
    operands.iter().map(number).collect()
}

/// WinAnsi bytes back to text
fn decode_win_ansi(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| match b {
            0x95 => '•',
            0x80 => '€',
            b => b as char,
        })
        .collect()
}

/// A drawn text run with the position of its `Td`
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub x: f64,
    pub y: f64,
}

/// Every `Tj` run of the page, in drawing order
pub fn text_runs(pdf: &[u8]) -> Vec<TextRun> {
    let mut runs = Vec::new();
    let (mut x, mut y) = (0.0, 0.0);
    for (operator, operands) in page_operations(pdf) {
        match operator.as_str() {
            "Td" => {
                x = number(&operands[0]);
                y = number(&operands[1]);
            }
            "Tj" => {
                if let Object::String(bytes, _) = &operands[0] {
                    runs.push(TextRun {
                        text: decode_win_ansi(bytes),
                        x,
                        y,
                    });
                }
            }
            _ => {}
        }
    }
    runs
}

/// All text of the page joined by single spaces
pub fn page_text(pdf: &[u8]) -> String {
    text_runs(pdf)
        .into_iter()
        .map(|run| run.text)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run whose text is exactly `text`
pub fn find_run(pdf: &[u8], text: &str) -> Option<TextRun> {
    text_runs(pdf).into_iter().find(|run| run.text == text)
}

/// `cm` matrices of every image placement
pub fn image_placements(pdf: &[u8]) -> Vec<Vec<f64>> {
    let ops = page_operations(pdf);
    ops.windows(2)
        .filter(|pair| pair[0].0 == "cm" && pair[1].0 == "Do")
        .map(|pair| numbers(&pair[0].1))
        .collect()
}

/// Horizontal segments as `(x1, x2, y)`
pub fn horizontal_lines(pdf: &[u8]) -> Vec<(f64, f64, f64)> {
    let ops = page_operations(pdf);
    ops.windows(2)
        .filter(|pair| pair[0].0 == "m" && pair[1].0 == "l")
        .filter_map(|pair| {
            let from = numbers(&pair[0].1);
            let to = numbers(&pair[1].1);
            (from[1] == to[1]).then(|| (from[0], to[0], from[1]))
        })
        .collect()
}
