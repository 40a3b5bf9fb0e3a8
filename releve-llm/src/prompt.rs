//! Fixed extraction instruction and the JSON schema sent with it.

use regex::Regex;
use serde_json::{Value, json};

pub const INSTRUCTION: &str = "\
Vous êtes un assistant spécialisé dans l'extraction de transactions financières à partir de relevés de comptes.
Votre tâche est d'identifier chaque transaction du relevé et d'en extraire la date, le montant et le libellé.

Instructions :
1. Repérez le solde initial et le solde final du relevé.
2. Identifiez chaque transaction du relevé.
3. Pour chaque transaction, extrayez :
   - la date de la transaction
   - le montant (positif pour un crédit, négatif pour un débit)
   - le libellé de la transaction
4. Organisez les informations extraites dans le format structuré demandé.";

/// Extra instruction for providers without schema-constrained output.
pub const JSON_ONLY: &str = "\
Répondez uniquement avec un objet JSON respectant ce schéma, sans texte autour :";

/// Schema of an account statement, in the strict form OpenAI expects
/// (every property required, no additional properties).
pub fn statement_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "initial_amount": { "type": "number", "description": "Montant initial" },
            "final_amount": { "type": "number", "description": "Montant final" },
            "transactions": {
                "type": "array",
                "description": "Liste des transactions",
                "items": {
                    "type": "object",
                    "properties": {
                        "date": { "type": "string", "description": "Date de la transaction" },
                        "label": { "type": "string", "description": "Libellé de la transaction" },
                        "amount": { "type": "number", "description": "Montant de la transaction" }
                    },
                    "required": ["date", "label", "amount"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["initial_amount", "final_amount", "transactions"],
        "additionalProperties": false
    })
}

/// User message carrying the statement text.
pub fn user_message(statement_text: &str) -> String {
    format!("Le relevé de compte à analyser :\n{statement_text}")
}

/// System prompt for providers that only get the schema in prose.
pub fn system_with_schema() -> String {
    format!("{INSTRUCTION}\n\n{JSON_ONLY}\n{}", statement_schema())
}

/// Strip a surrounding Markdown code fence, if any.
pub fn strip_code_fence(content: &str) -> Result<&str, regex::Error> {
    let fence_re = Regex::new(r"(?s)^\s*```[A-Za-z]*[ \t]*\n(?P<body>.*?)\n?\s*```\s*$")?;
    Ok(match fence_re.captures(content).and_then(|c| c.name("body")) {
        Some(m) => m.as_str(),
        None => content.trim(),
    })
}
