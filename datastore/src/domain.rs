use std::fmt;

/// Collections the document store client knows how to count
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Collection {
    Users,
    Files,
}

impl Collection {
    pub fn name(self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Files => "files",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A cache value. Text, numbers and booleans are all stored as text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheValue(String);

impl CacheValue {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<String> for CacheValue {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for CacheValue {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<&String> for CacheValue {
    fn from(value: &String) -> Self {
        Self(value.clone())
    }
}

macro_rules! cache_value_from_display {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for CacheValue {
                fn from(value: $ty) -> Self {
                    Self(value.to_string())
                }
            }
        )*
    };
}

cache_value_from_display!(bool, i32, i64, u32, u64, usize, f32, f64);
