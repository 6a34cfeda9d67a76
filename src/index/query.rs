use super::escape::escape_phrase;

const PHRASE_PLACEHOLDER: &str = "{PHRASE}";
const EXACT_MATCH_PATTERN: &str = "\"_prefix_ {PHRASE} _suffix_\"";

/// How a single field is matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// The whole field equals the phrase, ignoring case.
    ExactPhrase(String),
    /// The phrase tokens appear with at most `distance` words between them.
    Proximity { phrase: String, distance: u32 },
    /// The field holds exactly this value.
    Equals(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Criteria {
    pub field: &'static str,
    pub condition: Condition,
}

impl Criteria {
    pub fn exact(field: &'static str, phrase: &str) -> Self {
        Self {
            field,
            condition: Condition::ExactPhrase(phrase.to_string()),
        }
    }

    pub fn proximity(field: &'static str, phrase: &str, distance: u32) -> Self {
        Self {
            field,
            condition: Condition::Proximity {
                phrase: phrase.to_string(),
                distance,
            },
        }
    }

    pub fn equals(field: &'static str, value: &str) -> Self {
        Self {
            field,
            condition: Condition::Equals(value.to_string()),
        }
    }

    /// Query-syntax expression for the condition, with the phrase escaped.
    pub fn expression(&self) -> String {
        match &self.condition {
            Condition::ExactPhrase(phrase) => exact_expression(phrase),
            Condition::Proximity { phrase, distance } => proximity_expression(phrase, *distance),
            Condition::Equals(value) => format!("\"{}\"", escape_phrase(value)),
        }
    }

    pub fn to_query_string(&self) -> String {
        format!("{}:{}", self.field, self.expression())
    }
}

/// Phrase wrapped in the start/end token markers the exact fields are
/// indexed with, so only a complete field value matches.
pub fn exact_expression(phrase: &str) -> String {
    EXACT_MATCH_PATTERN.replace(PHRASE_PLACEHOLDER, &escape_phrase(phrase))
}

pub fn proximity_expression(phrase: &str, distance: u32) -> String {
    format!("\"{}\"~{}", escape_phrase(phrase), distance)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Zero-based page number.
    pub page: usize,
    pub size: usize,
}

impl PageRequest {
    pub fn new(page: usize, size: usize) -> Self {
        Self { page, size }
    }

    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.size)
    }
}

/// Criteria joined by AND, bounded to one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub criteria: Vec<Criteria>,
    pub page: PageRequest,
}

impl SearchQuery {
    pub fn new(criteria: Criteria, page: PageRequest) -> Self {
        Self {
            criteria: vec![criteria],
            page,
        }
    }

    pub fn and(mut self, criteria: Criteria) -> Self {
        self.criteria.push(criteria);
        self
    }

    pub fn to_query_string(&self) -> String {
        self.criteria
            .iter()
            .map(Criteria::to_query_string)
            .collect::<Vec<_>>()
            .join(" AND ")
    }
}

/// One page of results plus the total hit count.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub number: usize,
    pub size: usize,
    pub total_elements: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: u64) -> Self {
        Self {
            content,
            number: request.page,
            size: request.size,
            total_elements,
        }
    }

    pub fn empty(request: PageRequest) -> Self {
        Self::new(Vec::new(), request, 0)
    }

    pub fn total_pages(&self) -> usize {
        if self.size == 0 {
            return 1;
        }
        let size = self.size as u64;
        self.total_elements.div_ceil(size) as usize
    }

    pub fn number_of_elements(&self) -> usize {
        self.content.len()
    }

    pub fn is_first(&self) -> bool {
        !self.has_previous()
    }

    pub fn is_last(&self) -> bool {
        !self.has_next()
    }

    pub fn has_next(&self) -> bool {
        self.number.saturating_add(1) < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.number > 0
    }

    pub fn has_content(&self) -> bool {
        !self.content.is_empty()
    }
}
