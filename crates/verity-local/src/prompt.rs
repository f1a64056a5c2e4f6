//! Named-placeholder prompt rendering.
//!
//! Templates use `{{name}}` placeholders filled by explicit lookup. A
//! placeholder with no value is a hard error; substituted values are never
//! rescanned, so article text containing braces cannot confuse rendering.

use verity_core::{Error, Result};

pub fn render(template: &str, vars: &[(&str, &str)]) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            return Err(Error::Template("unterminated {{ placeholder".to_string()));
        };
        let name = after[..end].trim();
        let Some((_, value)) = vars.iter().find(|(n, _)| *n == name) else {
            return Err(Error::Template(format!(
                "no value for placeholder {{{{{name}}}}}"
            )));
        };
        out.push_str(value);
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_named_placeholders() {
        let s = render("on {{topic}}: {{ topic }} again", &[("topic", "cats")]).unwrap();
        assert_eq!(s, "on cats: cats again");
    }

    #[test]
    fn missing_value_is_an_error() {
        let err = render("hello {{who}}", &[]).unwrap_err();
        assert!(err.to_string().contains("{{who}}"));
    }

    #[test]
    fn braces_inside_values_are_not_rescanned() {
        let s = render("x={{v}}", &[("v", "{{not_a_placeholder}}")]).unwrap();
        assert_eq!(s, "x={{not_a_placeholder}}");
    }

    #[test]
    fn unused_vars_are_fine() {
        let s = render("plain", &[("unused", "v")]).unwrap();
        assert_eq!(s, "plain");
    }

    #[test]
    fn unterminated_placeholder_is_an_error() {
        assert!(render("oops {{name", &[("name", "v")]).is_err());
    }
}
