use crate::extraction::{Rect, Token};
use std::collections::BTreeMap;

/// Tokens sharing one `(block, line)` key, ordered left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub block: usize,
    pub line: usize,
    pub rect: Rect,
    pub text: String,
    pub tokens: Vec<Token>,
}

/// Group one page's tokens into lines keyed by `(block, line)`.
///
/// Lines come back ordered by block then line index; each line's tokens are
/// ordered by ascending x and its text is the tokens joined by one space.
pub fn group_lines(tokens: &[Token]) -> Vec<Line> {
    let mut keyed: BTreeMap<(usize, usize), Vec<Token>> = BTreeMap::new();
    for token in tokens {
        keyed
            .entry((token.block, token.line))
            .or_default()
            .push(token.clone());
    }

    keyed
        .into_iter()
        .filter_map(|((block, line), mut tokens)| {
            tokens.sort_by(|a, b| a.rect.x0.total_cmp(&b.rect.x0));
            let rect = tokens
                .iter()
                .skip(1)
                .fold(tokens.first()?.rect, |acc, t| acc.union(&t.rect));
            let text = tokens
                .iter()
                .map(|t| t.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            Some(Line {
                block,
                line,
                rect,
                text,
                tokens,
            })
        })
        .collect()
}

/// Build the visual row around `anchor`: every token whose top lies within
/// `y_tolerance` of the anchor's top, whatever block or line it came from.
///
/// The returned line keeps the anchor's `(block, line)` key.
pub fn visual_row(tokens: &[Token], anchor: &Line, y_tolerance: f32) -> Line {
    let mut row: Vec<Token> = tokens
        .iter()
        .filter(|t| (t.rect.y0 - anchor.rect.y0).abs() < y_tolerance)
        .cloned()
        .collect();
    if row.is_empty() {
        return anchor.clone();
    }
    row.sort_by(|a, b| a.rect.x0.total_cmp(&b.rect.x0));

    let rect = row
        .iter()
        .skip(1)
        .fold(row[0].rect, |acc, t| acc.union(&t.rect));
    let text = row
        .iter()
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    Line {
        block: anchor.block,
        line: anchor.line,
        rect,
        text,
        tokens: row,
    }
}

/// Cluster tokens into visual rows by top edge.
///
/// A token joins the first row whose anchor (the top of the token that
/// opened it) lies within `y_tolerance`; otherwise it opens a new row. Rows
/// are returned top to bottom with tokens left to right.
pub fn cluster_rows<'a, I>(tokens: I, y_tolerance: f32) -> Vec<Vec<&'a Token>>
where
    I: IntoIterator<Item = &'a Token>,
{
    let mut rows: Vec<(f32, Vec<&'a Token>)> = Vec::new();
    for token in tokens {
        match rows
            .iter_mut()
            .find(|(anchor, _)| (token.rect.y0 - anchor).abs() < y_tolerance)
        {
            Some((_, row)) => row.push(token),
            None => rows.push((token.rect.y0, vec![token])),
        }
    }

    rows.sort_by(|a, b| a.0.total_cmp(&b.0));
    rows.into_iter()
        .map(|(_, mut row)| {
            row.sort_by(|a, b| a.rect.x0.total_cmp(&b.rect.x0));
            row
        })
        .collect()
}
