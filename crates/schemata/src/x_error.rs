//! The `x-error` overlay: schema-authored replacement messages.
//!
//! An `x-error` value is either a string (one message for every error the
//! schema and its keywords produce) or a map keyed by keyword name, with `^`
//! for errors whose source is the schema itself and `*` as the fallback.
//! Templates interpolate `%{variable}` placeholders at error-reporting time.

use serde_json::Value;

use crate::paths::Location;

/// Select the template for errors produced by `keyword` on a schema carrying
/// `x_error`. Pass `"^"` as the keyword for schema-level sources.
pub(crate) fn template_for(x_error: Option<&Value>, keyword: &str) -> Option<String> {
    match x_error? {
        Value::String(message) => Some(message.clone()),
        Value::Object(map) => {
            for key in [keyword, "*"] {
                if let Some(Value::String(message)) = map.get(key) {
                    return Some(message.clone());
                }
            }
            None
        }
        _ => None,
    }
}

/// Template selection for boolean subschemas, which cannot carry `x-error`
/// themselves: the enclosing schema's map applies, keyed by the parent
/// keyword, then `^`, then `*`.
pub(crate) fn template_for_subschema(x_error: Option<&Value>, parent_keyword: &str) -> Option<String> {
    match x_error? {
        Value::String(message) => Some(message.clone()),
        Value::Object(map) => {
            for key in [parent_keyword, "^", "*"] {
                if let Some(Value::String(message)) = map.get(key) {
                    return Some(message.clone());
                }
            }
            None
        }
        _ => None,
    }
}

pub(crate) struct ErrorVariables<'a> {
    pub(crate) instance: &'a Value,
    pub(crate) instance_location: &'a Location,
    pub(crate) keyword_value: Option<&'a Value>,
    pub(crate) keyword_location: &'a Location,
    pub(crate) absolute_keyword_location: &'a str,
    pub(crate) details: Option<&'a Value>,
}

/// Replace `%{name}` placeholders. Unknown placeholders are left untouched.
pub(crate) fn interpolate(template: &str, variables: &ErrorVariables<'_>) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("%{") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            output.push_str(&rest[start..]);
            return output;
        };
        let name = &after[..end];
        match name {
            "instance" => output.push_str(&serialized(variables.instance)),
            "instanceLocation" => output.push_str(variables.instance_location.as_str()),
            "formattedInstanceLocation" => {
                output.push_str(&variables.instance_location.formatted());
            }
            "keywordValue" => match variables.keyword_value {
                Some(value) => output.push_str(&serialized(value)),
                None => output.push_str("null"),
            },
            "keywordLocation" => output.push_str(variables.keyword_location.as_str()),
            "absoluteKeywordLocation" => output.push_str(variables.absolute_keyword_location),
            "details" => match variables.details {
                Some(details) => output.push_str(&serialized(details)),
                None => output.push_str("null"),
            },
            unknown => {
                output.push_str("%{");
                output.push_str(unknown);
                output.push('}');
            }
        }
        rest = &after[end + 1..];
    }
    output.push_str(rest);
    output
}

fn serialized(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_form_applies_to_everything() {
        let x_error = json!("custom message");
        assert_eq!(
            template_for(Some(&x_error), "minimum").as_deref(),
            Some("custom message")
        );
        assert_eq!(
            template_for_subschema(Some(&x_error), "additionalProperties").as_deref(),
            Some("custom message")
        );
    }

    #[test]
    fn map_form_prefers_the_keyword() {
        let x_error = json!({"minimum": "too small", "*": "bad value"});
        assert_eq!(
            template_for(Some(&x_error), "minimum").as_deref(),
            Some("too small")
        );
        assert_eq!(
            template_for(Some(&x_error), "maximum").as_deref(),
            Some("bad value")
        );
        assert_eq!(template_for(None, "minimum"), None);
    }

    #[test]
    fn caret_matches_schema_level_sources() {
        let x_error = json!({"^": "schema said no"});
        assert_eq!(
            template_for_subschema(Some(&x_error), "not"),
            Some("schema said no".to_string())
        );
        assert_eq!(template_for(Some(&x_error), "minimum"), None);
    }

    #[test]
    fn interpolation() {
        let instance = json!({"age": 3});
        let keyword_value = json!(10);
        let instance_location = Location::from("/age");
        let keyword_location = Location::from("/properties/age/minimum");
        let variables = ErrorVariables {
            instance: &instance,
            instance_location: &instance_location,
            keyword_value: Some(&keyword_value),
            keyword_location: &keyword_location,
            absolute_keyword_location: "https://example.com/s#/properties/age/minimum",
            details: None,
        };
        assert_eq!(
            interpolate(
                "%{instance} at %{formattedInstanceLocation} fails %{keywordValue} (%{keywordLocation}) [%{unknown}]",
                &variables
            ),
            "{\"age\":3} at `/age` fails 10 (/properties/age/minimum) [%{unknown}]"
        );
    }
}
