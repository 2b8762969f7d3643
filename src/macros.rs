// Compiles a literal pattern once and hands out a `&'static Regex`.
//
// Only ever used with string literals, so a bad pattern is a programming
// error caught by the first test that touches it.
macro_rules! regex {
    ($re:literal $(,)?) => {{
        static RE: ::std::sync::OnceLock<::regex::Regex> = ::std::sync::OnceLock::new();
        RE.get_or_init(|| ::regex::Regex::new($re).unwrap())
    }};
}
