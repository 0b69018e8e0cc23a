use clap::Subcommand;
use etude_core::storage::CourseBook;

use super::{open_store, print_json, CliResult};

#[derive(Subcommand)]
pub enum CourseAction {
    /// List courses with their chapter checklists
    List {
        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a course
    Add {
        name: String,
        /// Chapter title (repeatable)
        #[arg(long = "chapter")]
        chapters: Vec<String>,
    },
    /// Append a chapter to a course
    Chapter { course_id: String, title: String },
    /// Tick a chapter off, or untick it
    Toggle {
        course_id: String,
        chapter_id: String,
    },
    /// Delete a course and its checklist
    Remove { course_id: String },
}

pub fn run(action: CourseAction) -> CliResult {
    let book = CourseBook::new(open_store()?);

    match action {
        CourseAction::List { json } => {
            let courses = book.courses();
            if json {
                return print_json(&courses);
            }
            for course in &courses {
                let (done, total) = course.progress();
                let star = if course.favorite { " *" } else { "" };
                println!("{}  {}{star}  ({done}/{total})", course.id, course.name);
                for ch in &course.chapters {
                    let mark = if ch.done { "x" } else { " " };
                    println!("    [{mark}] {}  {}", ch.id, ch.title);
                }
            }
        }
        CourseAction::Add { name, chapters } => {
            let course = book.create(&name, &chapters)?;
            print_json(&course)?;
        }
        CourseAction::Chapter { course_id, title } => match book.add_chapter(&course_id, &title)? {
            Some(chapter) => print_json(&chapter)?,
            None => return Err(format!("no course with id '{course_id}'").into()),
        },
        CourseAction::Toggle {
            course_id,
            chapter_id,
        } => match book.toggle_chapter(&course_id, &chapter_id)? {
            Some(done) => print_json(&serde_json::json!({ "id": chapter_id, "done": done }))?,
            None => return Err(format!("no chapter '{chapter_id}' in course '{course_id}'").into()),
        },
        CourseAction::Remove { course_id } => {
            if !book.remove(&course_id)? {
                return Err(format!("no course with id '{course_id}'").into());
            }
            println!("deleted {course_id}");
        }
    }
    Ok(())
}
