// src/oracle/prompts.rs
use serde_json::{json, Value};

use super::{OraclePolicy, OracleRequest};

/// Enum value used when a round has nothing answerable; the schema requires a non-empty enum.
pub const NO_LEGAL_ID: &str = "__none__";

pub fn system_prompt() -> &'static str {
    "You fill job application forms truthfully from the given profile. \
     Return ONLY valid JSON that matches the provided schema."
}

pub fn user_prompt(request: &OracleRequest, policy: OraclePolicy) -> Result<String, serde_json::Error> {
    let fields = serde_json::to_string(&request.fields)?;

    let mut instructions = vec![
        "- Produce JSON with 'answers': [{id, value}, ...].",
        "- TEXT/TEXTAREA: id = field id; value = short truthful answer.",
        "- SINGLE-SELECT: id = field id; value = one of the VISIBLE option labels from context.",
        "- RADIO-GROUP: choose exactly one option and use that OPTION's id as 'id'. \
         The value may be true, 'selected' or the option label; only the id is used.",
    ];
    if policy.fabricate_missing {
        instructions.push(
            "- If the profile does not answer a question, make up a suitable answer based on the profile details.",
        );
    } else {
        instructions.push("- If the profile does not answer a question, leave that question out.");
    }
    if policy.favorable_yes_no {
        instructions.push(
            "- Answer yes/no screening questions in the way that keeps the application eligible.",
        );
    }

    Ok(format!(
        "PROFILE:\n{}\n\nFORM FIELDS CONTEXT (IDs, labels, options):\n{}\n\nINSTRUCTIONS:\n{}",
        request.profile,
        fields,
        instructions.join("\n")
    ))
}

/// Strict answer schema; `id` is restricted to the legal identifier set.
pub fn answer_schema(legal_ids: &[String]) -> Value {
    let ids: Vec<&str> = if legal_ids.is_empty() {
        vec![NO_LEGAL_ID]
    } else {
        legal_ids.iter().map(String::as_str).collect()
    };

    json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["answers"],
        "properties": {
            "answers": {
                "type": "array",
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "required": ["id", "value"],
                    "properties": {
                        "id": { "type": "string", "enum": ids },
                        "value": {
                            "anyOf": [
                                { "type": "string" },
                                { "type": "boolean" },
                                { "type": "number" }
                            ]
                        }
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> OracleRequest {
        OracleRequest {
            profile: "Rust engineer, 6 years, based in Leeds".to_string(),
            fields: Vec::new(),
            legal_ids: vec!["text-question-input-1".to_string()],
        }
    }

    #[test]
    fn test_policy_flags_change_instructions() {
        let strict = user_prompt(
            &request(),
            OraclePolicy {
                fabricate_missing: false,
                favorable_yes_no: false,
            },
        )
        .unwrap();
        assert!(strict.contains("leave that question out"));
        assert!(!strict.contains("eligible"));

        let eager = user_prompt(
            &request(),
            OraclePolicy {
                fabricate_missing: true,
                favorable_yes_no: true,
            },
        )
        .unwrap();
        assert!(eager.contains("make up a suitable answer"));
        assert!(eager.contains("eligible"));
        assert!(eager.starts_with("PROFILE:\nRust engineer"));
    }

    #[test]
    fn test_schema_enum() {
        let schema = answer_schema(&request().legal_ids);
        assert_eq!(
            schema["properties"]["answers"]["items"]["properties"]["id"]["enum"],
            json!(["text-question-input-1"])
        );

        let empty = answer_schema(&[]);
        assert_eq!(
            empty["properties"]["answers"]["items"]["properties"]["id"]["enum"],
            json!([NO_LEGAL_ID])
        );
    }
}
