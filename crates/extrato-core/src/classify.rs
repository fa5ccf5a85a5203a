//! Income/expense classification
//!
//! An ordered rule chain decides the economic direction of each record from
//! its description and the pre-normalization signed amount. The chain is a
//! pure function: identical inputs always yield identical outputs, and each
//! rule is independently testable.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::TransactionType;

/// Pattern matching type for keyword rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternType {
    /// Case-insensitive substring match
    Contains,
    /// Exact string match (case-insensitive)
    Exact,
    /// Regular expression match
    Regex,
}

impl PatternType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::Exact => "exact",
            Self::Regex => "regex",
        }
    }
}

impl std::str::FromStr for PatternType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "contains" => Ok(Self::Contains),
            "exact" => Ok(Self::Exact),
            "regex" => Ok(Self::Regex),
            _ => Err(format!("Unknown pattern type: {}", s)),
        }
    }
}

/// What triggers a classification rule
#[derive(Debug, Clone)]
enum RuleMatcher {
    ZeroAmount,
    NegativeAmount,
    PositiveAmount,
    /// Any keyword matches the lower-cased description
    Keywords {
        pattern_type: PatternType,
        keywords: Vec<String>,
    },
}

/// A single classification rule; rules run in chain order, first match wins.
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub result: TransactionType,
    matcher: RuleMatcher,
}

impl Rule {
    /// Keyword rule over the lower-cased description.
    pub fn keywords(
        name: impl Into<String>,
        result: TransactionType,
        pattern_type: PatternType,
        keywords: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            result,
            matcher: RuleMatcher::Keywords {
                pattern_type,
                keywords: keywords
                    .into_iter()
                    .map(|k| k.into().to_lowercase())
                    .collect(),
            },
        }
    }

    fn amount(name: &str, result: TransactionType, matcher: RuleMatcher) -> Self {
        Self {
            name: name.to_string(),
            result,
            matcher,
        }
    }

    /// Whether this rule fires for the given description/amount.
    ///
    /// `description_lower` must already be lower-cased; `classify` does that
    /// once per record.
    pub fn matches(&self, description_lower: &str, signed_amount: f64) -> bool {
        match &self.matcher {
            RuleMatcher::ZeroAmount => signed_amount == 0.0,
            RuleMatcher::NegativeAmount => signed_amount < 0.0,
            RuleMatcher::PositiveAmount => signed_amount > 0.0,
            RuleMatcher::Keywords {
                pattern_type,
                keywords,
            } => keywords.iter().any(|keyword| match pattern_type {
                PatternType::Contains => description_lower.contains(keyword.as_str()),
                PatternType::Exact => description_lower == keyword.as_str(),
                PatternType::Regex => match Regex::new(keyword) {
                    Ok(re) => re.is_match(description_lower),
                    Err(e) => {
                        warn!("Skipping unparsable rule pattern {:?}: {}", keyword, e);
                        false
                    }
                },
            }),
        }
    }
}

/// Known merchants that only ever appear on the debit side of a statement:
/// retailers, delivery apps, utility and subscription brands.
///
/// Short brand names that commonly show up inside reversal descriptions
/// ("Estorno Uber") are deliberately left out; those lines must fall through
/// to the income-context tier.
const KNOWN_MERCHANTS: &[&str] = &[
    // Delivery apps
    "ifood",
    "uber eats",
    "rappi",
    // Retailers
    "mercado livre",
    "mercadolivre",
    "magazine luiza",
    "magalu",
    "americanas",
    "casas bahia",
    "shopee",
    "aliexpress",
    "carrefour",
    "pão de açúcar",
    "pao de acucar",
    "atacadão",
    "atacadao",
    // Utilities and subscriptions
    "netflix",
    "spotify",
    "globoplay",
    "sabesp",
    "enel",
    "cemig",
    "copel",
    "comgás",
    "comgas",
];

/// Debit-context keywords. Phrases are kept specific enough that credit
/// lines like "Pagamento recebido" fall through to the income tier.
const EXPENSE_KEYWORDS: &[&str] = &[
    "pagamento efetuado",
    "pagamento enviado",
    "pagamento de boleto",
    "boleto",
    "cartão",
    "cartao",
    "enviado",
    "compra",
    "débito",
    "debito",
    "saque",
    "tarifa",
    "fatura",
    "mensalidade",
];

/// Credit-context keywords.
const INCOME_KEYWORDS: &[&str] = &[
    "recebido",
    "recebida",
    "salário",
    "salario",
    "estorno",
    "reembolso",
    "devolução",
    "devolucao",
    "rendimento",
    "depósito",
    "deposito",
];

/// Ordered rule chain deciding income vs. expense
#[derive(Debug, Clone)]
pub struct TypeClassifier {
    rules: Vec<Rule>,
}

impl Default for TypeClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeClassifier {
    /// Built-in chain, strictly ordered:
    ///
    /// 1. zero amount -> expense (explicit default, not a fallback)
    /// 2. negative amount -> expense
    /// 3. known-merchant list -> expense
    /// 4. expense-context keywords -> expense
    /// 5. income-context keywords -> income
    /// 6. positive amount -> income
    pub fn new() -> Self {
        Self {
            rules: vec![
                Rule::amount("zero-amount", TransactionType::Expense, RuleMatcher::ZeroAmount),
                Rule::amount(
                    "negative-amount",
                    TransactionType::Expense,
                    RuleMatcher::NegativeAmount,
                ),
                Rule::keywords(
                    "known-merchant",
                    TransactionType::Expense,
                    PatternType::Contains,
                    KNOWN_MERCHANTS.iter().copied(),
                ),
                Rule::keywords(
                    "expense-context",
                    TransactionType::Expense,
                    PatternType::Contains,
                    EXPENSE_KEYWORDS.iter().copied(),
                ),
                Rule::keywords(
                    "income-context",
                    TransactionType::Income,
                    PatternType::Contains,
                    INCOME_KEYWORDS.iter().copied(),
                ),
                Rule::amount(
                    "positive-amount",
                    TransactionType::Income,
                    RuleMatcher::PositiveAmount,
                ),
            ],
        }
    }

    /// Built-in chain with caller-supplied rules inserted ahead of the
    /// keyword tiers (after the amount-sign rules, which are unconditional).
    ///
    /// Regex patterns are validated here so a bad rule fails loudly instead
    /// of silently never matching.
    pub fn with_rules(extra: Vec<Rule>) -> Result<Self> {
        for rule in &extra {
            if let RuleMatcher::Keywords {
                pattern_type: PatternType::Regex,
                keywords,
            } = &rule.matcher
            {
                for keyword in keywords {
                    Regex::new(keyword)?;
                }
            }
        }

        let mut classifier = Self::new();
        let at = classifier
            .rules
            .iter()
            .position(|r| r.name == "known-merchant")
            .unwrap_or(classifier.rules.len());
        classifier.rules.splice(at..at, extra);
        Ok(classifier)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Classify one record. Pure: no state, no side effects beyond logging.
    pub fn classify(&self, description: &str, signed_amount: f64) -> TransactionType {
        let description_lower = description.to_lowercase();
        for rule in &self.rules {
            if rule.matches(&description_lower, signed_amount) {
                debug!(
                    rule = rule.name.as_str(),
                    result = rule.result.as_str(),
                    "classified {:?}",
                    description
                );
                return rule.result;
            }
        }

        // Unreachable with the built-in chain (the amount rules are total),
        // but the explicit default keeps user-supplied chains safe.
        TransactionType::Expense
    }
}
