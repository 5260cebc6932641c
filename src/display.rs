use crate::evaluation::EvaluationQueue;
use crate::model::{Course, Member, Registry, Staff, Student};
use std::io::{self, Write};

pub fn display_students(out: &mut impl Write, students: &[&Student]) -> io::Result<()> {
    if students.is_empty() {
        return writeln!(out, "No students found.");
    }
    for s in students {
        writeln!(out, "{s}")?;
    }
    Ok(())
}

/// Show a student together with the courses they attend.
pub fn display_student_details(
    out: &mut impl Write,
    registry: &Registry,
    student: &Student,
) -> io::Result<()> {
    writeln!(out, "{student}")?;
    for c in registry.courses_for_student(student.id()) {
        writeln!(out, "  - {} ({})", c.name(), c.id())?;
    }
    Ok(())
}

pub fn display_staff(out: &mut impl Write, staff: &[&Staff]) -> io::Result<()> {
    if staff.is_empty() {
        return writeln!(out, "No staff found.");
    }
    for s in staff {
        writeln!(out, "{s}")?;
    }
    Ok(())
}

/// List courses with their enrolled students. Instructors and students
/// missing from the registry are flagged rather than hidden.
pub fn display_courses(
    out: &mut impl Write,
    registry: &Registry,
    courses: &[&Course],
) -> io::Result<()> {
    if courses.is_empty() {
        return writeln!(out, "No courses found.");
    }
    for c in courses {
        write!(out, "{c}")?;
        match (c.instructor_id(), registry.instructor_of(c.id())) {
            (_, Some(instructor)) => write!(out, " | Taught by: {}", instructor.name())?,
            (Some(_), None) => write!(out, " | Instructor not on staff")?,
            (None, None) => (),
        }
        writeln!(out)?;
        for id in c.enrolled_student_ids() {
            match registry.find_student(id) {
                Some(s) => writeln!(out, "  - {} {}", s.id(), s.name())?,
                None => writeln!(out, "  - {id} (unknown student)")?,
            }
        }
    }
    Ok(())
}

pub fn display_members<'a>(
    out: &mut impl Write,
    members: impl IntoIterator<Item = Member<'a>>,
) -> io::Result<()> {
    let mut empty = true;
    for m in members {
        writeln!(out, "{}", m.display_label())?;
        empty = false;
    }
    if empty {
        writeln!(out, "No members found.")?;
    }
    Ok(())
}

pub fn display_enrollments(out: &mut impl Write, registry: &Registry) -> io::Result<()> {
    let enrollments = registry.enrollments();
    if enrollments.is_empty() {
        return writeln!(out, "No enrollments.");
    }
    for e in enrollments {
        writeln!(out, "{e}")?;
    }
    Ok(())
}

pub fn display_queue(out: &mut impl Write, queue: &EvaluationQueue) -> io::Result<()> {
    if queue.is_empty() {
        return writeln!(out, "Queue is empty.");
    }
    for (n, command) in queue.pending().enumerate() {
        writeln!(out, "  {}. {command}", n + 1)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_display_courses() {
        let mut r = Registry::new();
        r.add_student(Student::new("S1", "Ada", 20, "", 0.0).unwrap());
        r.add_staff(Staff::new("T1", "Alan", 41, "Computing").unwrap());
        r.add_course(Course::new("C1", "Algebra", 2, Some("T1")).unwrap());
        r.add_course(Course::new("C2", "Biology", 2, Some("T2")).unwrap());
        assert!(r.enroll_student_in_course("S1", "C1"));
        let courses = r.courses().iter().collect::<Vec<_>>();
        assert_eq!(
            render(|out| display_courses(out, &r, &courses)),
            "C1 | Algebra | Capacity: 2 | Instructor: T1 | Enrolled: 1 | Taught by: Alan\n  - S1 Ada\n\
             C2 | Biology | Capacity: 2 | Instructor: T2 | Enrolled: 0 | Instructor not on staff\n"
        );
        let s1 = r.find_student("S1").unwrap();
        assert_eq!(
            render(|out| display_student_details(out, &r, s1)),
            "S1 | Ada | Age: 20 | Type: Student | Major:  | Score: 0.0\n  - Algebra (C1)\n"
        );
    }

    #[test]
    fn test_members_and_enrollments() {
        let mut r = Registry::new();
        assert_eq!(render(|out| display_members(out, r.members())), "No members found.\n");
        assert_eq!(render(|out| display_enrollments(out, &r)), "No enrollments.\n");
        r.add_student(Student::new("S1", "Ada", 20, "Maths", 1.5).unwrap());
        r.add_staff(Staff::new("T1", "Alan", 41, "").unwrap());
        r.add_course(Course::new("C1", "Algebra", 2, Some("T1")).unwrap());
        assert!(r.enroll_student_in_course("s1", "c1"));
        assert_eq!(
            render(|out| display_members(out, r.members())),
            "S1 | Ada | Age: 20 | Type: Student | Major: Maths | Score: 1.5\n\
             T1 | Alan | Age: 41 | Type: Staff | Dept: Unknown\n"
        );
        assert_eq!(
            render(|out| display_enrollments(out, &r)),
            "Student: S1 -> Course: C1\n"
        );
    }

    #[test]
    fn test_empty_lists() {
        assert_eq!(render(|out| display_students(out, &[])), "No students found.\n");
        assert_eq!(render(|out| display_staff(out, &[])), "No staff found.\n");
        let mut q = EvaluationQueue::new();
        assert_eq!(render(|out| display_queue(out, &q)), "Queue is empty.\n");
        q.schedule("R,S1,2");
        assert_eq!(render(|out| display_queue(out, &q)), "  1. R,S1,2\n");
    }
}
