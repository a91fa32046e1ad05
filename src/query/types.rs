use bson::Bson;

// Safety limits to prevent resource abuse
pub(crate) const MAX_IN_SET: usize = 1000;
pub(crate) const MAX_CLAUSES: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CmpOp {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "$eq",
            Self::Ne => "$ne",
            Self::Gt => "$gt",
            Self::Gte => "$gte",
            Self::Lt => "$lt",
            Self::Lte => "$lte",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    True,
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Nor(Vec<Filter>),
    Not(Box<Filter>),
    Exists { path: String, exists: bool },
    In { path: String, values: Vec<Bson> },
    Nin { path: String, values: Vec<Bson> },
    Cmp { path: String, op: CmpOp, value: Bson },
    #[cfg(feature = "regex")]
    Regex { path: String, pattern: String, case_insensitive: bool },
}

impl Filter {
    /// Single-field equality, the shape `$lookup` issues against its target.
    #[must_use]
    pub fn eq(path: impl Into<String>, value: Bson) -> Self {
        Self::Cmp { path: path.into(), op: CmpOp::Eq, value }
    }

    pub(crate) fn all_of(mut clauses: Vec<Self>) -> Self {
        match clauses.len() {
            0 => Self::True,
            1 => clauses.remove(0),
            _ => Self::And(clauses),
        }
    }

    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::True => "true",
            Self::And(_) => "$and",
            Self::Or(_) => "$or",
            Self::Nor(_) => "$nor",
            Self::Not(_) => "$not",
            Self::Exists { .. } => "$exists",
            Self::In { .. } => "$in",
            Self::Nin { .. } => "$nin",
            Self::Cmp { op, .. } => op.as_str(),
            #[cfg(feature = "regex")]
            Self::Regex { .. } => "$regex",
        }
    }
}
