use super::*;
use clap::ValueEnum;
use std::cmp::Reverse;
use tracing::{debug, trace};

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum StudentOrder {
    Id,
    Name,
    /// Highest score first.
    Score,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum StaffOrder {
    Id,
    Name,
    Department,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CourseOrder {
    Id,
    Name,
    /// Most enrolled students first.
    Enrollment,
}

/// Owner of every student, staff member and course. All mutations go
/// through it so that identifiers stay unique and enrollments only ever
/// reference existing students.
#[derive(Debug, Default)]
pub struct Registry {
    students: Vec<Student>,
    staff: Vec<Staff>,
    courses: Vec<Course>,
}

fn caseless(s: &str) -> String {
    s.to_lowercase()
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn staff(&self) -> &[Staff] {
        &self.staff
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    // Students

    /// Add a student unless one with the same id is already present.
    pub fn add_student(&mut self, student: Student) {
        if self.find_student(student.id()).is_some() {
            debug!(id = %student.id(), "ignoring student with duplicate id");
            return;
        }
        self.students.push(student);
    }

    pub fn find_student(&self, id: &str) -> Option<&Student> {
        let id = id.trim();
        self.students.iter().find(|s| same_id(s.id(), id))
    }

    pub(crate) fn find_student_mut(&mut self, id: &str) -> Option<&mut Student> {
        let id = id.trim();
        self.students.iter_mut().find(|s| same_id(s.id(), id))
    }

    /// Students whose name matches exactly, ignoring case.
    pub fn find_students_by_name(&self, name: &str) -> Vec<&Student> {
        let name = caseless(name.trim());
        self.students
            .iter()
            .filter(|s| caseless(s.name()) == name)
            .collect()
    }

    pub fn update_student(&mut self, id: &str, update: StudentUpdate) -> bool {
        let Some(student) = self.find_student_mut(id) else {
            return false;
        };
        if let Change::Set(name) = update.name {
            student.set_name(&name);
        }
        if let Change::Set(age) = update.age {
            student.set_age(age);
        }
        if let Change::Set(major) = update.major {
            student.set_major(&major);
        }
        trace!(student = %student, "student updated");
        true
    }

    /// Delete a student and withdraw them from every course.
    pub fn delete_student(&mut self, id: &str) -> bool {
        let id = id.trim();
        let Some(pos) = self.students.iter().position(|s| same_id(s.id(), id)) else {
            return false;
        };
        let student = self.students.remove(pos);
        for course in &mut self.courses {
            if course.remove_enrollment(student.id()) {
                trace!(student = %student.id(), course = %course.id(), "enrollment cascaded");
            }
        }
        true
    }

    pub fn students_sorted(&self, order: StudentOrder) -> Vec<&Student> {
        match order {
            StudentOrder::Id => {
                let mut students = self.students.iter().collect::<Vec<_>>();
                students.sort_by_cached_key(|s| caseless(s.id()));
                students
            }
            StudentOrder::Name => self.students_sorted_by_name(),
            StudentOrder::Score => self.students_sorted_by_score(),
        }
    }

    pub fn students_sorted_by_name(&self) -> Vec<&Student> {
        let mut students = self.students.iter().collect::<Vec<_>>();
        students.sort_by_cached_key(|s| caseless(s.name()));
        students
    }

    /// Highest score first, ties keeping insertion order.
    pub fn students_sorted_by_score(&self) -> Vec<&Student> {
        let mut students = self.students.iter().collect::<Vec<_>>();
        students.sort_by(|a, b| b.performance_score().total_cmp(&a.performance_score()));
        students
    }

    // Staff

    pub fn add_staff(&mut self, staff: Staff) {
        if self.find_staff(staff.id()).is_some() {
            debug!(id = %staff.id(), "ignoring staff with duplicate id");
            return;
        }
        self.staff.push(staff);
    }

    pub fn find_staff(&self, id: &str) -> Option<&Staff> {
        let id = id.trim();
        self.staff.iter().find(|s| same_id(s.id(), id))
    }

    pub fn update_staff(&mut self, id: &str, update: StaffUpdate) -> bool {
        let id = id.trim();
        let Some(staff) = self.staff.iter_mut().find(|s| same_id(s.id(), id)) else {
            return false;
        };
        if let Change::Set(name) = update.name {
            staff.set_name(&name);
        }
        if let Change::Set(age) = update.age {
            staff.set_age(age);
        }
        if let Change::Set(department) = update.department {
            staff.set_department(&department);
        }
        true
    }

    /// Delete a staff member. Courses keep referencing them as instructor.
    pub fn delete_staff(&mut self, id: &str) -> bool {
        let id = id.trim();
        let before = self.staff.len();
        self.staff.retain(|s| !same_id(s.id(), id));
        self.staff.len() != before
    }

    pub fn staff_sorted(&self, order: StaffOrder) -> Vec<&Staff> {
        let mut staff = self.staff.iter().collect::<Vec<_>>();
        match order {
            StaffOrder::Id => staff.sort_by_cached_key(|s| caseless(s.id())),
            StaffOrder::Name => staff.sort_by_cached_key(|s| caseless(s.name())),
            StaffOrder::Department => staff.sort_by_cached_key(|s| caseless(s.department())),
        }
        staff
    }

    // Students and staff alike

    pub fn members(&self) -> impl Iterator<Item = Member<'_>> {
        self.students
            .iter()
            .map(Member::from)
            .chain(self.staff.iter().map(Member::from))
    }

    pub fn find_member(&self, id: &str) -> Option<Member<'_>> {
        self.find_student(id)
            .map(Member::from)
            .or_else(|| self.find_staff(id).map(Member::from))
    }

    // Courses

    pub fn add_course(&mut self, course: Course) {
        if self.find_course(course.id()).is_some() {
            debug!(id = %course.id(), "ignoring course with duplicate id");
            return;
        }
        self.courses.push(course);
    }

    pub fn find_course(&self, id: &str) -> Option<&Course> {
        let id = id.trim();
        self.courses.iter().find(|c| same_id(c.id(), id))
    }

    fn find_course_mut(&mut self, id: &str) -> Option<&mut Course> {
        let id = id.trim();
        self.courses.iter_mut().find(|c| same_id(c.id(), id))
    }

    /// Update a course in place, keeping its enrollment. A capacity lower
    /// than the number of enrolled students is refused and nothing changes.
    pub fn update_course(&mut self, id: &str, update: CourseUpdate) -> bool {
        let Some(course) = self.find_course_mut(id) else {
            return false;
        };
        if let Change::Set(capacity) = update.capacity {
            if !course.set_capacity(capacity) {
                debug!(
                    course = %course.id(),
                    capacity,
                    enrolled = course.enrolled_count(),
                    "refusing capacity below current enrollment"
                );
                return false;
            }
        }
        if let Change::Set(name) = update.name {
            course.set_name(&name);
        }
        if let Change::Set(instructor_id) = update.instructor_id {
            course.set_instructor_id(instructor_id.as_deref());
        }
        trace!(course = %course, "course updated");
        true
    }

    /// Delete a course. Student records are left untouched.
    pub fn delete_course(&mut self, id: &str) -> bool {
        let id = id.trim();
        let before = self.courses.len();
        self.courses.retain(|c| !same_id(c.id(), id));
        self.courses.len() != before
    }

    pub fn courses_sorted(&self, order: CourseOrder) -> Vec<&Course> {
        let mut courses = self.courses.iter().collect::<Vec<_>>();
        match order {
            CourseOrder::Id => courses.sort_by_cached_key(|c| caseless(c.id())),
            CourseOrder::Name => courses.sort_by_cached_key(|c| caseless(c.name())),
            CourseOrder::Enrollment => courses.sort_by_key(|c| Reverse(c.enrolled_count())),
        }
        courses
    }

    /// The instructor of a course, if it names an existing staff member.
    pub fn instructor_of(&self, course_id: &str) -> Option<&Staff> {
        self.find_course(course_id)
            .and_then(Course::instructor_id)
            .and_then(|i| self.find_staff(i))
    }

    // Enrollments

    /// Enroll an existing student into an existing course, provided the
    /// course has room and the student is not enrolled already.
    pub fn enroll_student_in_course(&mut self, student_id: &str, course_id: &str) -> bool {
        let Some(student_id) = self.find_student(student_id).map(|s| s.id().to_owned()) else {
            return false;
        };
        let Some(course) = self.find_course_mut(course_id) else {
            return false;
        };
        let enrolled = course.enroll(&student_id);
        trace!(student = %student_id, course = %course.id(), enrolled, "enrollment attempt");
        enrolled
    }

    pub fn remove_student_from_course(&mut self, student_id: &str, course_id: &str) -> bool {
        self.find_course_mut(course_id)
            .is_some_and(|c| c.remove_enrollment(student_id.trim()))
    }

    pub fn courses_for_student(&self, student_id: &str) -> Vec<&Course> {
        let student_id = student_id.trim();
        self.courses
            .iter()
            .filter(|c| c.is_enrolled(student_id))
            .collect()
    }

    pub fn enrollments(&self) -> Vec<Enrollment<'_>> {
        self.courses
            .iter()
            .flat_map(|c| {
                c.enrolled_student_ids().iter().map(|s| Enrollment {
                    student_id: s,
                    course_id: c.id(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::person::Kind;
    use proptest::prelude::*;

    fn student(id: &str, name: &str, score: f64) -> Student {
        Student::new(id, name, 20, "Maths", score).unwrap()
    }

    fn sample() -> Registry {
        let mut r = Registry::new();
        r.add_student(student("S1", "Ada", 10.0));
        r.add_student(student("S2", "grace", 30.0));
        r.add_student(student("S3", "Barbara", 20.0));
        r.add_staff(Staff::new("T1", "Alan", 41, "Computing").unwrap());
        r.add_course(Course::new("C1", "Algebra", 2, Some("T1")).unwrap());
        r.add_course(Course::new("C2", "Biology", 1, Some("T9")).unwrap());
        r
    }

    #[test]
    fn test_duplicate_ids_are_ignored() {
        let mut r = sample();
        r.add_student(student("s1", "Impostor", 0.0));
        r.add_staff(Staff::new("t1", "Impostor", 30, "").unwrap());
        r.add_course(Course::new("c1", "Impostor", 3, None).unwrap());
        assert_eq!(r.students().len(), 3);
        assert_eq!(r.find_student("S1").unwrap().name(), "Ada");
        assert_eq!(r.staff().len(), 1);
        assert_eq!(r.courses().len(), 2);
    }

    #[test]
    fn test_lookups_ignore_case() {
        let r = sample();
        assert_eq!(r.find_student(" s2 ").unwrap().name(), "grace");
        assert_eq!(r.find_course("c2").unwrap().name(), "Biology");
        assert!(r.find_staff("T2").is_none());
        assert_eq!(r.find_students_by_name("GRACE").len(), 1);
        assert!(r.find_students_by_name("gra").is_empty());
        assert_eq!(r.find_member("t1").unwrap().kind(), Kind::Staff);
        assert_eq!(r.members().count(), 4);
    }

    #[test]
    fn test_update_student_only_touches_given_fields() {
        let mut r = sample();
        let update = StudentUpdate {
            major: Change::Set("Biology".to_owned()),
            ..StudentUpdate::default()
        };
        assert!(r.update_student("S1", update));
        let s = r.find_student("S1").unwrap();
        assert_eq!(s.major(), "Biology");
        assert_eq!(s.name(), "Ada");
        assert_eq!(s.age(), 20);
        assert_eq!(s.performance_score(), 10.0);
        assert!(!r.update_student("S9", StudentUpdate::default()));
    }

    #[test]
    fn test_update_staff() {
        let mut r = sample();
        let update = StaffUpdate {
            name: Change::Set("Alan Turing".to_owned()),
            ..StaffUpdate::default()
        };
        assert!(r.update_staff("t1", update));
        let st = r.find_staff("T1").unwrap();
        assert_eq!(st.name(), "Alan Turing");
        assert_eq!(st.department(), "Computing");
    }

    #[test]
    fn test_capacity_one_course() {
        let mut r = sample();
        assert!(r.enroll_student_in_course("S1", "C2"));
        assert!(!r.enroll_student_in_course("S2", "C2"));
        assert_eq!(r.find_course("C2").unwrap().enrolled_student_ids(), ["S1"]);
    }

    #[test]
    fn test_enrollment_failures() {
        let mut r = sample();
        assert!(!r.enroll_student_in_course("S9", "C1"));
        assert!(!r.enroll_student_in_course("S1", "C9"));
        assert!(r.enroll_student_in_course("s1", "C1"));
        assert!(!r.enroll_student_in_course("S1", "c1"));
        // The canonical id is recorded, not the spelling used by the caller.
        assert_eq!(r.find_course("C1").unwrap().enrolled_student_ids(), ["S1"]);
        assert!(!r.remove_student_from_course("S2", "C1"));
        assert!(!r.remove_student_from_course("S1", "C9"));
        assert!(r.remove_student_from_course("S1", "C1"));
    }

    #[test]
    fn test_delete_student_cascades() {
        let mut r = sample();
        assert!(r.enroll_student_in_course("S1", "C1"));
        assert!(r.enroll_student_in_course("S2", "C1"));
        assert!(r.enroll_student_in_course("S1", "C2"));
        assert!(r.delete_student("s1"));
        assert!(!r.delete_student("S1"));
        assert!(r.courses().iter().all(|c| !c.is_enrolled("S1")));
        assert_eq!(r.find_course("C1").unwrap().enrolled_student_ids(), ["S2"]);
        assert!(r.courses_for_student("S1").is_empty());
    }

    #[test]
    fn test_delete_course_leaves_students() {
        let mut r = sample();
        assert!(r.enroll_student_in_course("S1", "C1"));
        assert!(r.delete_course("C1"));
        assert!(!r.delete_course("C1"));
        assert_eq!(r.students().len(), 3);
        assert!(r.courses_for_student("S1").is_empty());
    }

    #[test]
    fn test_delete_staff_keeps_course_instructor() {
        let mut r = sample();
        assert_eq!(r.instructor_of("C1").unwrap().name(), "Alan");
        assert!(r.delete_staff("T1"));
        assert!(!r.delete_staff("T1"));
        assert_eq!(r.find_course("C1").unwrap().instructor_id(), Some("T1"));
        assert!(r.instructor_of("C1").is_none());
    }

    #[test]
    fn test_update_course_keeps_enrollment() {
        let mut r = sample();
        assert!(r.enroll_student_in_course("S1", "C1"));
        assert!(r.enroll_student_in_course("S2", "C1"));
        let update = CourseUpdate {
            name: Change::Set("Linear Algebra".to_owned()),
            capacity: Change::Set(5),
            ..CourseUpdate::default()
        };
        assert!(r.update_course("c1", update));
        let c = r.find_course("C1").unwrap();
        assert_eq!(c.name(), "Linear Algebra");
        assert_eq!(c.capacity(), 5);
        assert_eq!(c.instructor_id(), Some("T1"));
        assert_eq!(c.enrolled_student_ids(), ["S1", "S2"]);
        let clear = CourseUpdate {
            instructor_id: Change::Set(None),
            ..CourseUpdate::default()
        };
        assert!(r.update_course("C1", clear));
        assert_eq!(r.find_course("C1").unwrap().instructor_id(), None);
        assert!(!r.update_course("C9", CourseUpdate::default()));
    }

    #[test]
    fn test_update_course_refuses_shrinking_below_enrollment() {
        let mut r = sample();
        assert!(r.enroll_student_in_course("S1", "C1"));
        assert!(r.enroll_student_in_course("S2", "C1"));
        let update = CourseUpdate {
            name: Change::Set("Renamed".to_owned()),
            capacity: Change::Set(1),
            ..CourseUpdate::default()
        };
        assert!(!r.update_course("C1", update));
        let c = r.find_course("C1").unwrap();
        assert_eq!(c.name(), "Algebra");
        assert_eq!(c.capacity(), 2);
    }

    #[test]
    fn test_sorting() {
        let mut r = sample();
        let names = |v: Vec<&Student>| v.iter().map(|s| s.name().to_owned()).collect::<Vec<_>>();
        assert_eq!(names(r.students_sorted_by_name()), ["Ada", "Barbara", "grace"]);
        assert_eq!(names(r.students_sorted_by_score()), ["grace", "Barbara", "Ada"]);
        assert_eq!(names(r.students_sorted(StudentOrder::Id)), ["Ada", "grace", "Barbara"]);
        assert!(r.enroll_student_in_course("S1", "C2"));
        assert!(r.enroll_student_in_course("S1", "C1"));
        assert!(r.enroll_student_in_course("S2", "C1"));
        let ids = r
            .courses_sorted(CourseOrder::Enrollment)
            .iter()
            .map(|c| c.id())
            .collect::<Vec<_>>();
        assert_eq!(ids, ["C1", "C2"]);
        assert_eq!(r.enrollments().len(), 3);
        assert_eq!(r.courses_for_student("s1").len(), 2);
    }

    #[derive(Clone, Debug)]
    enum Op {
        AddStudent(u8),
        AddCourse(u8, u8),
        Enroll(u8, u8),
        Unenroll(u8, u8),
        DeleteStudent(u8),
        DeleteCourse(u8),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..8).prop_map(Op::AddStudent),
            (0u8..4, 0u8..4).prop_map(|(c, cap)| Op::AddCourse(c, cap)),
            (0u8..8, 0u8..4).prop_map(|(s, c)| Op::Enroll(s, c)),
            (0u8..8, 0u8..4).prop_map(|(s, c)| Op::Unenroll(s, c)),
            (0u8..8).prop_map(Op::DeleteStudent),
            (0u8..4).prop_map(Op::DeleteCourse),
        ]
    }

    proptest! {
        #[test]
        fn random_operations_keep_registry_consistent(ops in prop::collection::vec(op_strategy(), 1..120)) {
            let mut r = Registry::new();
            for op in ops {
                match op {
                    // Alternate the case of ids to exercise case-insensitive uniqueness.
                    Op::AddStudent(s) => {
                        let id = if s % 2 == 0 { format!("S{s}") } else { format!("s{s}") };
                        r.add_student(Student::new(&id, "Name", 20, "", 0.0).unwrap());
                        r.add_student(Student::new(&id.to_uppercase(), "Other", 20, "", 0.0).unwrap());
                    }
                    Op::AddCourse(c, cap) => {
                        r.add_course(Course::new(&format!("C{c}"), "Course", u32::from(cap), None).unwrap());
                    }
                    Op::Enroll(s, c) => {
                        r.enroll_student_in_course(&format!("S{s}"), &format!("c{c}"));
                    }
                    Op::Unenroll(s, c) => {
                        r.remove_student_from_course(&format!("s{s}"), &format!("C{c}"));
                    }
                    Op::DeleteStudent(s) => {
                        let id = format!("S{s}");
                        let deleted = r.delete_student(&id);
                        prop_assert!(!deleted || r.find_student(&id).is_none());
                        prop_assert!(r.courses_for_student(&id).is_empty());
                    }
                    Op::DeleteCourse(c) => {
                        r.delete_course(&format!("C{c}"));
                    }
                }
                let mut ids = r.students().iter().map(|s| s.id().to_lowercase()).collect::<Vec<_>>();
                ids.sort();
                ids.dedup();
                prop_assert_eq!(ids.len(), r.students().len());
                for course in r.courses() {
                    prop_assert!(course.enrolled_count() <= course.capacity() as usize);
                    for s in course.enrolled_student_ids() {
                        prop_assert!(r.find_student(s).is_some());
                    }
                }
            }
        }
    }
}
