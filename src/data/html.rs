//! Low-level HTML table helpers.
//!
//! These are deliberately naive: they find tag blocks by case-insensitive
//! substring search and strip markup to text. That is enough for the two
//! prime-rate pages, which are plain server-rendered tables.

/// One `<tr>` block: the row text and the text of each `<td>`/`<th>` cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlRow {
    pub text: String,
    pub cells: Vec<String>,
}

/// Fast ASCII-only lowercasing for tag/attribute matching.
///
/// Non-ASCII characters are kept as-is so byte offsets stay aligned with `s`.
pub fn to_lowercase_fast(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii() { c.to_ascii_lowercase() } else { c })
        .collect()
}

/// Find the next complete tag block from `from` onwards, case-insensitive.
/// A block runs from the start of the opening tag to the end of the closing tag.
pub fn next_tag_block_ci(s: &str, open_tag: &str, close_tag: &str, from: usize) -> Option<(usize, usize)> {
    let lc = to_lowercase_fast(s);
    let open_lc = to_lowercase_fast(open_tag);
    let close_lc = to_lowercase_fast(close_tag);

    let start = find_tag(&lc, &open_lc, from)?;
    let open_end = s[start..].find('>')? + start + 1;
    let end_rel = lc[open_end..].find(&close_lc)?;
    let end = open_end + end_rel + close_tag.len();
    Some((start, end))
}

/// Given a complete block like `<td ...>INNER</td>`, return INNER.
pub fn inner_after_open_tag(block: &str) -> &str {
    if let Some(open_end) = block.find('>') {
        if let Some(close_start) = block.rfind('<') {
            if close_start > open_end {
                return &block[open_end + 1..close_start];
            }
        }
    }
    ""
}

/// Remove all tags, decode the common entities, then collapse whitespace.
pub fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    normalize_ws(&normalize_entities(&out))
}

/// Minimal HTML entity decoding.
pub fn normalize_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .replace("&amp;", "&")
}

/// Collapse runs of whitespace (including non-breaking spaces) into one space and trim.
pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out.trim().to_string()
}

/// Return the inner HTML of the `<tbody>` of the first table whose opening tag
/// mentions `class_name`.
pub fn table_body_by_class<'a>(html: &'a str, class_name: &str) -> Option<&'a str> {
    let lc = to_lowercase_fast(html);
    let class_lc = to_lowercase_fast(class_name);

    let mut from = 0;
    while let Some(start) = find_tag(&lc, "<table", from) {
        let open_end = lc[start..].find('>')? + start;
        let close = lc[open_end..].find("</table>").map(|i| i + open_end)?;
        if lc[start..open_end].contains(&class_lc) {
            let table = &html[open_end + 1..close];
            return match next_tag_block_ci(table, "<tbody", "</tbody>", 0) {
                Some((s, e)) => Some(inner_after_open_tag(&table[s..e])),
                None => Some(table),
            };
        }
        from = open_end;
    }
    None
}

/// Split an HTML fragment into its `<tr>` rows.
pub fn rows(fragment: &str) -> Vec<HtmlRow> {
    let mut out = Vec::new();
    let mut pos = 0usize;
    while let Some((tr_s, tr_e)) = next_tag_block_ci(fragment, "<tr", "</tr>", pos) {
        let tr = &fragment[tr_s..tr_e];
        pos = tr_e;
        out.push(HtmlRow {
            text: strip_tags(inner_after_open_tag(tr)),
            cells: cells(tr),
        });
    }
    out
}

fn cells(tr: &str) -> Vec<String> {
    let lc = to_lowercase_fast(tr);
    let mut out = Vec::new();
    let mut pos = 0usize;
    loop {
        let td = find_tag(&lc, "<td", pos);
        let th = find_tag(&lc, "<th", pos);
        let (start, close) = match (td, th) {
            (Some(a), Some(b)) if b < a => (b, "</th>"),
            (Some(a), _) => (a, "</td>"),
            (None, Some(b)) => (b, "</th>"),
            (None, None) => break,
        };
        let Some((s, e)) = next_tag_block_ci(tr, &tr[start..start + 3], close, start) else {
            break;
        };
        out.push(strip_tags(inner_after_open_tag(&tr[s..e])));
        pos = e;
    }
    out
}

/// Find `tag` (e.g. `<tr`) at or after `from`, requiring the tag name to end
/// there so `<t` never matches `<table` or `<tbody`.
fn find_tag(lc: &str, tag: &str, from: usize) -> Option<usize> {
    let mut pos = from;
    loop {
        let idx = lc.get(pos..)?.find(tag)? + pos;
        let next = lc[idx + tag.len()..].chars().next();
        match next {
            Some(c) if c == '>' || c == '/' || c.is_whitespace() => return Some(idx),
            _ => pos = idx + tag.len(),
        }
    }
}
