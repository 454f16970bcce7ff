//! Keyword-based conversation titles.
//!
//! Titles are derived from the first few messages: a category label when the text
//! mentions one of the known topics, otherwise a truncated copy of the first user
//! message.

use std::collections::{BTreeSet, HashSet};

use crate::models::{Message, MessageRole};
use crate::store::message_store::first_by_role;

/// Number of leading messages scanned for keywords.
const SCAN_WINDOW: usize = 4;
/// Tokens with this many characters or fewer are never keywords.
const MAX_IGNORED_TOKEN_CHARS: usize = 3;
/// Words kept from the first user message when falling back to truncation.
const TRUNCATED_WORDS: usize = 6;
/// First user messages longer than this get a truncated title instead of the generic one.
const TRUNCATION_THRESHOLD_CHARS: usize = 10;
const ELLIPSIS: &str = "...";

pub const DEFAULT_PLACEHOLDER: &str = "Nova conversa";
pub const DEFAULT_FALLBACK: &str = "Conversa geral";

pub const LABEL_ANXIETY: &str = "Ansiedade e estresse";
pub const LABEL_CAREER: &str = "Carreira e trabalho";
pub const LABEL_RELATIONSHIPS: &str = "Relacionamentos";
pub const LABEL_STUDY: &str = "Estudos";
pub const LABEL_HEALTH: &str = "Saúde e bem-estar";

const DEFAULT_STOP_WORDS: &[&str] = &[
    "agora", "ainda", "antes", "aquela", "aquele", "aquilo", "assim", "coisa", "coisas",
    "como", "cada", "dela", "dele", "delas", "deles", "depois", "desde", "esse", "essa",
    "esses", "essas", "este", "esta", "estes", "estas", "estar", "estou", "está", "estava",
    "eles", "elas", "entao", "então", "fazer", "foram", "hoje", "isso", "isto", "mais",
    "mesmo", "minha", "minhas", "muito", "muita", "muitos", "muitas", "nada", "nossa",
    "nosso", "onde", "outra", "outro", "para", "pela", "pelo", "pelas", "pelos", "pode",
    "posso", "porque", "quais", "qual", "quando", "quem", "seria", "seus", "suas", "sempre",
    "sobre", "também", "tambem", "tenho", "tinha", "tudo", "você", "voce", "vocês", "voces",
    "aqui", "meus", "sendo", "somos", "eram", "estão", "estao", "teve", "temos",
];

/// A topic label and the keywords that select it.
#[derive(Debug, Clone)]
pub struct CategoryRule {
    label: String,
    triggers: HashSet<String>,
}

impl CategoryRule {
    pub fn new(label: impl Into<String>, triggers: &[&str]) -> Self {
        Self {
            label: label.into(),
            triggers: triggers.iter().map(|t| t.to_lowercase()).collect(),
        }
    }

    fn matches(&self, keywords: &BTreeSet<String>) -> bool {
        keywords.iter().any(|k| self.triggers.contains(k))
    }
}

/// Tables driving [`SummaryEngine`]. Category rules are tried in order and the first
/// whose triggers intersect the keyword set wins.
#[derive(Debug, Clone)]
pub struct SummaryRules {
    pub placeholder: String,
    pub fallback: String,
    pub stop_words: HashSet<String>,
    pub categories: Vec<CategoryRule>,
}

impl Default for SummaryRules {
    fn default() -> Self {
        Self {
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            fallback: DEFAULT_FALLBACK.to_string(),
            stop_words: DEFAULT_STOP_WORDS.iter().map(|w| (*w).to_string()).collect(),
            categories: vec![
                // Nouns only: "ansioso com o trabalho" must be titled as work,
                // so "ansioso"/"ansiosa" alone fall through to truncation.
                CategoryRule::new(
                    LABEL_ANXIETY,
                    &[
                        "ansiedade", "estresse", "stress", "estressado", "estressada", "pânico",
                        "panico", "nervosismo", "angústia", "angustia", "crise", "tensão",
                        "tensao",
                    ],
                ),
                CategoryRule::new(
                    LABEL_CAREER,
                    &[
                        "trabalho", "trabalhar", "emprego", "carreira", "chefe", "profissional",
                        "empresa", "salário", "salario", "demissão", "demissao", "reunião",
                        "reuniao", "colegas", "promoção", "promocao",
                    ],
                ),
                CategoryRule::new(
                    LABEL_RELATIONSHIPS,
                    &[
                        "relacionamento", "namoro", "namorado", "namorada", "casamento",
                        "marido", "esposa", "família", "familia", "amigos", "amizade",
                        "término", "termino", "amor",
                    ],
                ),
                CategoryRule::new(
                    LABEL_STUDY,
                    &[
                        "estudo", "estudos", "estudar", "prova", "provas", "faculdade",
                        "escola", "curso", "exame", "vestibular", "concurso", "universidade",
                        "aula", "aulas",
                    ],
                ),
                CategoryRule::new(
                    LABEL_HEALTH,
                    &[
                        "saúde", "saude", "sono", "dormir", "insônia", "insonia", "cansaço",
                        "cansaco", "exercício", "exercicio", "alimentação", "alimentacao",
                        "médico", "medico", "doença", "doenca",
                    ],
                ),
            ],
        }
    }
}

/// Pure title derivation over a message sequence.
#[derive(Debug, Clone, Default)]
pub struct SummaryEngine {
    rules: SummaryRules,
}

impl SummaryEngine {
    pub fn new(rules: SummaryRules) -> Self {
        Self { rules }
    }

    pub fn placeholder(&self) -> &str {
        &self.rules.placeholder
    }

    pub fn summarize(&self, messages: &[Message]) -> String {
        if messages.len() < 2 {
            return self.rules.placeholder.clone();
        }

        let scan = messages
            .iter()
            .take(SCAN_WINDOW)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let keywords = self.keywords(&scan);

        if let Some(rule) = self.rules.categories.iter().find(|r| r.matches(&keywords)) {
            return rule.label.clone();
        }

        match first_by_role(messages, MessageRole::User) {
            Some(first) if first.content.chars().count() > TRUNCATION_THRESHOLD_CHARS => {
                let head = first
                    .content
                    .split_whitespace()
                    .take(TRUNCATED_WORDS)
                    .collect::<Vec<_>>()
                    .join(" ");
                format!("{head}{ELLIPSIS}")
            }
            _ => self.rules.fallback.clone(),
        }
    }

    fn keywords(&self, text: &str) -> BTreeSet<String> {
        let cleaned: String = text
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric() || c.is_whitespace())
            .collect();

        cleaned
            .split_whitespace()
            .filter(|t| t.chars().count() > MAX_IGNORED_TOKEN_CHARS)
            .filter(|t| !self.rules.stop_words.contains(*t))
            .map(str::to_string)
            .collect()
    }
}
