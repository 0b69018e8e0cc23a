//! Course checklists.

use std::collections::HashSet;
use std::sync::Arc;

use super::{KvStore, ListStore, COURSES_KEY};
use crate::error::{Result, ValidationError};
use crate::records::{Chapter, Course};

#[derive(Clone)]
pub struct CourseBook {
    store: Arc<dyn KvStore>,
}

impl CourseBook {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub fn courses(&self) -> Vec<Course> {
        self.store.get_list(COURSES_KEY)
    }

    /// Creates a course with the given chapter titles; blank titles are skipped.
    ///
    /// # Errors
    /// Returns an error if the name is blank or the store write fails.
    pub fn create(&self, name: &str, chapters: &[String]) -> Result<Course> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "name".into(),
                message: "a course needs a name".into(),
            }
            .into());
        }
        let course = Course {
            id: format!("course-{}", uuid::Uuid::new_v4()),
            name: name.to_string(),
            chapters: chapters
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .map(Chapter::new)
                .collect(),
            favorite: false,
        };
        let mut all = self.courses();
        all.push(course.clone());
        self.store.set_list(COURSES_KEY, &all)?;
        Ok(course)
    }

    /// Appends a chapter to `course_id`. Returns `None` when no such course exists.
    ///
    /// # Errors
    /// Returns an error if the title is blank or the store write fails.
    pub fn add_chapter(&self, course_id: &str, title: &str) -> Result<Option<Chapter>> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "title".into(),
                message: "a chapter needs a title".into(),
            }
            .into());
        }
        let mut all = self.courses();
        let Some(course) = all.iter_mut().find(|c| c.id == course_id) else {
            return Ok(None);
        };
        let chapter = Chapter::new(title);
        course.chapters.push(chapter.clone());
        self.store.set_list(COURSES_KEY, &all)?;
        Ok(Some(chapter))
    }

    /// Flips a chapter's `done` flag and returns the new value, or `None` when
    /// the course or chapter does not exist.
    ///
    /// # Errors
    /// Returns an error if the store write fails.
    pub fn toggle_chapter(&self, course_id: &str, chapter_id: &str) -> Result<Option<bool>> {
        let mut all = self.courses();
        let Some(chapter) = all
            .iter_mut()
            .find(|c| c.id == course_id)
            .and_then(|c| c.chapters.iter_mut().find(|ch| ch.id == chapter_id))
        else {
            return Ok(None);
        };
        chapter.done = !chapter.done;
        let done = chapter.done;
        self.store.set_list(COURSES_KEY, &all)?;
        Ok(Some(done))
    }

    /// # Errors
    /// Returns an error if the store write fails.
    pub fn remove(&self, course_id: &str) -> Result<bool> {
        let mut all = self.courses();
        let before = all.len();
        all.retain(|c| c.id != course_id);
        if all.len() == before {
            return Ok(false);
        }
        self.store.set_list(COURSES_KEY, &all)?;
        Ok(true)
    }

    /// Follows a subject rename. When a course named `to` already exists the
    /// two are merged: chapters with a new title move over, and the merged
    /// course is a favorite if either was. Returns whether anything changed.
    ///
    /// # Errors
    /// Returns an error if the store write fails.
    pub fn rename(&self, from: &str, to: &str) -> Result<bool> {
        if from == to {
            return Ok(false);
        }
        let mut all = self.courses();
        let Some(from_idx) = all.iter().position(|c| c.name.trim() == from) else {
            return Ok(false);
        };
        match all.iter().position(|c| c.name.trim() == to) {
            Some(to_idx) => {
                let source = all[from_idx].clone();
                let target = &mut all[to_idx];
                let mut titles: HashSet<String> = target
                    .chapters
                    .iter()
                    .map(|ch| ch.title.trim().to_string())
                    .collect();
                for chapter in source.chapters {
                    let title = chapter.title.trim().to_string();
                    if !title.is_empty() && titles.insert(title) {
                        target.chapters.push(chapter);
                    }
                }
                target.favorite |= source.favorite;
                all.remove(from_idx);
            }
            None => all[from_idx].name = to.to_string(),
        }
        self.store.set_list(COURSES_KEY, &all)?;
        Ok(true)
    }
}
