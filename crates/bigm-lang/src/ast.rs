use crate::lexer::Span;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub items: Vec<Item>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Objective(Objective),
    Inequality(Inequality),
}

/// `min: 3*x1 + 2*x2;`
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    pub span: Span,
    pub terms: Vec<Term>,
}

/// `R1: 3*x1 + 2*x2 >= 2;`
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Inequality {
    pub span: Span,
    pub label: Option<String>,
    pub terms: Vec<Term>,
    pub rhs: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub span: Span,
    pub coefficient: f64,
    pub variable: String,
}

impl Term {
    pub fn new(span: Span, coefficient: f64, variable: impl Into<String>) -> Self {
        Self {
            span,
            coefficient,
            variable: variable.into(),
        }
    }
}

impl Program {
    pub fn objectives(&self) -> impl Iterator<Item = &Objective> {
        self.items.iter().filter_map(|item| match item {
            Item::Objective(o) => Some(o),
            Item::Inequality(_) => None,
        })
    }

    pub fn inequalities(&self) -> impl Iterator<Item = &Inequality> {
        self.items.iter().filter_map(|item| match item {
            Item::Inequality(i) => Some(i),
            Item::Objective(_) => None,
        })
    }
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}*{}", self.coefficient, self.variable)
    }
}
