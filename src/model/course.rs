use super::same_id;
use eyre::{Result, ensure};
use std::fmt;

#[derive(Clone, Debug, PartialEq)]
pub struct Course {
    id: String,
    name: String,
    capacity: u32,
    instructor_id: Option<String>,
    enrolled: Vec<String>,
}

impl Course {
    /// Build a course with no enrollment. The capacity is at least 1, and a
    /// blank instructor id means no instructor.
    pub fn new(id: &str, name: &str, capacity: u32, instructor_id: Option<&str>) -> Result<Course> {
        let (id, name) = (id.trim(), name.trim());
        ensure!(!id.is_empty(), "course id cannot be empty");
        ensure!(!name.is_empty(), "course name cannot be empty");
        Ok(Course {
            id: id.to_owned(),
            name: name.to_owned(),
            capacity: capacity.max(1),
            instructor_id: normalize_instructor(instructor_id),
            enrolled: Vec::new(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn instructor_id(&self) -> Option<&str> {
        self.instructor_id.as_deref()
    }

    /// Enrolled student ids, in enrollment order.
    pub fn enrolled_student_ids(&self) -> &[String] {
        &self.enrolled
    }

    pub fn enrolled_count(&self) -> usize {
        self.enrolled.len()
    }

    pub fn is_full(&self) -> bool {
        self.enrolled.len() >= self.capacity as usize
    }

    pub fn is_enrolled(&self, student_id: &str) -> bool {
        self.enrolled.iter().any(|s| same_id(s, student_id))
    }

    pub fn enroll(&mut self, student_id: &str) -> bool {
        let student_id = student_id.trim();
        if student_id.is_empty() || self.is_full() || self.is_enrolled(student_id) {
            return false;
        }
        self.enrolled.push(student_id.to_owned());
        true
    }

    pub fn remove_enrollment(&mut self, student_id: &str) -> bool {
        match self.enrolled.iter().position(|s| same_id(s, student_id)) {
            Some(pos) => {
                self.enrolled.remove(pos);
                true
            }
            None => false,
        }
    }

    pub(super) fn set_name(&mut self, name: &str) {
        let name = name.trim();
        if !name.is_empty() {
            self.name = name.to_owned();
        }
    }

    /// Change the capacity unless it would drop below the current
    /// enrollment count.
    pub(super) fn set_capacity(&mut self, capacity: u32) -> bool {
        let capacity = capacity.max(1);
        if (capacity as usize) < self.enrolled.len() {
            return false;
        }
        self.capacity = capacity;
        true
    }

    pub(super) fn set_instructor_id(&mut self, instructor_id: Option<&str>) {
        self.instructor_id = normalize_instructor(instructor_id);
    }

    pub fn display_label(&self) -> String {
        format!(
            "{} | {} | Capacity: {} | Instructor: {} | Enrolled: {}",
            self.id,
            self.name,
            self.capacity,
            self.instructor_id().unwrap_or(""),
            self.enrolled.len()
        )
    }
}

impl fmt::Display for Course {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.display_label())
    }
}

fn normalize_instructor(instructor_id: Option<&str>) -> Option<String> {
    instructor_id
        .map(str::trim)
        .filter(|i| !i.is_empty())
        .map(String::from)
}

/// A student enrolled in a course.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Enrollment<'a> {
    pub student_id: &'a str,
    pub course_id: &'a str,
}

impl fmt::Display for Enrollment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Student: {} -> Course: {}", self.student_id, self.course_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_is_at_least_one() {
        let c = Course::new("C1", "Algebra", 0, Some("  ")).unwrap();
        assert_eq!(c.capacity(), 1);
        assert_eq!(c.instructor_id(), None);
    }

    #[test]
    fn test_enroll_respects_capacity_and_duplicates() {
        let mut c = Course::new("C1", "Algebra", 2, Some("T1")).unwrap();
        assert!(c.enroll("S1"));
        assert!(!c.enroll("s1"));
        assert!(!c.enroll(" "));
        assert!(c.enroll("S2"));
        assert!(c.is_full());
        assert!(!c.enroll("S3"));
        assert_eq!(c.enrolled_student_ids(), ["S1", "S2"]);
    }

    #[test]
    fn test_remove_enrollment() {
        let mut c = Course::new("C1", "Algebra", 3, None).unwrap();
        c.enroll("S1");
        c.enroll("S2");
        assert!(c.remove_enrollment("s1"));
        assert!(!c.remove_enrollment("S1"));
        assert_eq!(c.enrolled_student_ids(), ["S2"]);
    }

    #[test]
    fn test_capacity_cannot_shrink_below_enrollment() {
        let mut c = Course::new("C1", "Algebra", 3, None).unwrap();
        c.enroll("S1");
        c.enroll("S2");
        assert!(!c.set_capacity(1));
        assert_eq!(c.capacity(), 3);
        assert!(c.set_capacity(2));
        assert_eq!(c.capacity(), 2);
    }

    #[test]
    fn test_display_label() {
        let mut c = Course::new("C1", "Algebra", 3, Some("T1")).unwrap();
        c.enroll("S1");
        assert_eq!(
            c.to_string(),
            "C1 | Algebra | Capacity: 3 | Instructor: T1 | Enrolled: 1"
        );
        let e = Enrollment {
            student_id: "S1",
            course_id: c.id(),
        };
        assert_eq!(e.to_string(), "Student: S1 -> Course: C1");
    }
}
