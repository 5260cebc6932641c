/// Per-field instruction of an update: keep the current value or replace it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Change<T> {
    Keep,
    Set(T),
}

impl<T> Default for Change<T> {
    fn default() -> Self {
        Change::Keep
    }
}

impl<T> Change<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, Change::Keep)
    }
}

impl<T> From<Option<T>> for Change<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Change::Keep, Change::Set)
    }
}

impl Change<String> {
    /// Interpret free text typed by a user, where a blank answer means
    /// "leave as is".
    pub fn from_input(input: &str) -> Self {
        match input.trim() {
            "" => Change::Keep,
            value => Change::Set(value.to_owned()),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StudentUpdate {
    pub name: Change<String>,
    pub age: Change<u32>,
    pub major: Change<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StaffUpdate {
    pub name: Change<String>,
    pub age: Change<u32>,
    pub department: Change<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CourseUpdate {
    pub name: Change<String>,
    pub capacity: Change<u32>,
    /// `Set(None)` removes the instructor.
    pub instructor_id: Change<Option<String>>,
}

impl CourseUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_keep() && self.capacity.is_keep() && self.instructor_id.is_keep()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_input() {
        assert_eq!(Change::from_input("   "), Change::Keep);
        assert_eq!(
            Change::from_input(" Biology "),
            Change::Set("Biology".to_owned())
        );
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Change::<u32>::from(None), Change::Keep);
        assert_eq!(Change::from(Some(3)), Change::Set(3));
        assert!(CourseUpdate::default().is_empty());
    }
}
