use super::Schema;

const HEADER: &str = "\
# Configuration file
#
# Generated with default values. Edit the values below and restart the
# application to apply them.
";

const INSTRUCTIONS: &str = "\
# Usage instructions
# ------------------
# - Each [Section] groups related settings.
# - Settings are written as `key = value`, one per line.
# - Anything after a `#` is a comment and is ignored.
# - Lists are comma-separated numbers without brackets, e.g. `1.0,2.0,3.0`.
# - Integer settings take whole numbers only.
# - A value that cannot be read, or that breaks the constraint shown in its
#   comment, is replaced by its default when the file is loaded.
# - Delete this file to regenerate it with default values.
";

/// Renders a commented config file holding every schema default.
///
/// Sections and keys appear in schema order. Each key line carries its kind,
/// its description and, when present, its rule:
///
/// ```text
/// [ABT]
/// kor = 500.0 # type: float, description: ABT kor value (Must be greater than 0)
/// ```
pub fn generate_config(schema: &Schema) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');

    for section in schema.sections() {
        out.push_str(&format!("[{}]\n", section.name));
        for item in &section.items {
            out.push_str(&format!(
                "{} = {} # type: {}, description: {}",
                item.name, item.default, item.kind, item.description
            ));
            if let Some(rule) = &item.rule {
                out.push_str(&format!(" ({})", rule.describe()));
            }
            out.push('\n');
        }
        out.push('\n');
    }

    out.push_str(INSTRUCTIONS);
    out
}
