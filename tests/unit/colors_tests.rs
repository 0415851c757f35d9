use dav_blob_store::ColorSupport;

type Formatter = fn(ColorSupport, &str) -> String;

const FORMATTERS: &[(&str, Formatter, &str)] = &[
    ("red", ColorSupport::red, "\x1b[91m"),
    ("green", ColorSupport::green, "\x1b[32m"),
    ("cyan", ColorSupport::cyan, "\x1b[36m"),
    ("yellow", ColorSupport::yellow, "\x1b[33m"),
    ("gray", ColorSupport::gray, "\x1b[90m"),
    ("bold", ColorSupport::bold, "\x1b[1m"),
    ("purple_underline", ColorSupport::purple_underline, "\x1b[35;4m"),
    ("no_color", ColorSupport::no_color, "\x1b[0m"),
];

#[test]
fn test_enabled_wraps_text() {
    for (name, format, code) in FORMATTERS {
        assert_eq!(
            format(ColorSupport::Enabled, "INFO"),
            format!("{code}INFO\x1b[0m"),
            "{name}"
        );
    }
}

#[test]
fn test_enabled_leaves_whitespace_alone() {
    for (name, format, _) in FORMATTERS {
        for ws in ["  ", "\n", "\t", "\r"] {
            assert_eq!(format(ColorSupport::Enabled, ws), ws, "{name}");
        }
    }
}

#[test]
fn test_disabled_returns_plain_text() {
    for (name, format, _) in FORMATTERS {
        assert_eq!(format(ColorSupport::Disabled, "PLAIN"), "PLAIN", "{name}");
    }
}

#[test]
fn test_term_detection() {
    assert_eq!(ColorSupport::from_term(Some("xterm")), ColorSupport::Enabled);
    assert_eq!(ColorSupport::from_term(Some("")), ColorSupport::Disabled);
    assert_eq!(ColorSupport::from_term(None), ColorSupport::Disabled);
}
