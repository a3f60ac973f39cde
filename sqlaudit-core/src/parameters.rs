use crate::values::Value;

/// The parameters bound to a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Parameters {
    Positional(Vec<Value>),
}

impl Parameters {
    pub fn len(&self) -> usize {
        match self {
            Parameters::Positional(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Parameters::Positional(values) => values.is_empty(),
        }
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        match self {
            Parameters::Positional(values) => values.get(index),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        match self {
            Parameters::Positional(values) => values.iter(),
        }
    }
}

impl From<Vec<Value>> for Parameters {
    fn from(values: Vec<Value>) -> Self {
        Parameters::Positional(values)
    }
}
