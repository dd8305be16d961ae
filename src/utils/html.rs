use ammonia;

/// Clean HTML content using the ammonia library.
///
/// Question explanations come from the quiz service as free text and are shown
/// verbatim by the review screen. Safe tags (like <b>, <p>) are kept while
/// dangerous tags (like <script>, <iframe>) and attributes (like onclick) are
/// stripped, including the entire content of <script>.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
