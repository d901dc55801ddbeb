use regex::Regex;
use std::sync::LazyLock;

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._]").expect("static pattern"));
static UNDERSCORE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_+").expect("static pattern"));

/// Reduce a string to `[A-Za-z0-9._]`: spaces become underscores, everything
/// else outside the set is dropped, and underscore runs collapse to one.
pub fn clean_string(input: &str) -> String {
    let underscored = input.replace(' ', "_");
    let stripped = DISALLOWED.replace_all(&underscored, "");
    UNDERSCORE_RUNS.replace_all(&stripped, "_").into_owned()
}

/// One `#` per character of `input`.
pub fn mask_string(input: &str) -> String {
    "#".repeat(input.chars().count())
}

/// Placeholder `<tr>` for tables with no rows.
pub fn no_record_found_row(col_span: u32, tr_class: &str, message: &str) -> String {
    format!(
        "<tr class='{}'><td colspan='{}'><center>{}</center></td></tr>",
        escape_html(tr_class),
        col_span,
        escape_html(message)
    )
}

/// [`no_record_found_row`] with the stock colspan, class and message.
pub fn default_no_record_found_row() -> String {
    no_record_found_row(2, "tr_no_data_found", "No Data Available")
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&#39;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
