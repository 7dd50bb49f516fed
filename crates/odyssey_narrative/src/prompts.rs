//! Prompt construction for the narrative stages.

use odyssey_core::{Chapter, PacingDirective, PlannedChapter, StoryParameters};

pub(crate) const OPTIMIZER_SYSTEM: &str = "\
You are the pacing editor of an interactive story. Every chapter follows a \
five-phase rhythm: introduction, rising tension, climax, resolution, and \
transition into the next chapter. Given the chapter and the latest exchange, \
decide the single next beat the narrator should dramatize and whether the \
chapter has run its course.

Reply with exactly three lines and nothing else:
NEXT_BEAT: <one or two sentences describing what should happen next>
TRANSITION: <yes or no>
PHASE: <introduction | rising | climax | resolution | transition>";

pub(crate) const NARRATOR_SYSTEM: &str = "\
You are the narrator of an interactive story. Continue the story in response \
to the player, in second person, staying within the current chapter. End every \
turn by offering the player exactly three distinct choices. Decide whether \
this turn completes the chapter.

Reply with a single JSON object and nothing else:
{\"text\": \"<narration>\", \"choices\": [\"<choice 1>\", \"<choice 2>\", \"<choice 3>\"], \"should_transition\": <true|false>}";

pub(crate) const PREDICTOR_INITIALIZE_SYSTEM: &str = "\
You are the story architect of an interactive story. Plan the story as an \
ordered list of chapters, each a bounded narrative unit with its own arc. \
Choose as many chapters as the story needs.

Reply with a single JSON object and nothing else:
{\"chapters\": [{\"title\": \"<title>\", \"description\": \"<what happens>\"}]}
The first chapter is where the story begins.";

pub(crate) const PREDICTOR_REFRESH_SYSTEM: &str = "\
You are the story architect of an interactive story. Given what the player \
just did, revise the current chapter and the planned chapters only as much as \
needed to keep the story coherent. Completed chapters are context only and \
cannot change. Report exactly what you changed.

Reply with a single JSON object and nothing else:
{\"current\": {\"title\": \"...\", \"description\": \"...\"},
 \"future\": [{\"title\": \"...\", \"description\": \"...\"}],
 \"modifications\": {\"current_chapter_modified\": false, \"future_chapters_modified\": false, \"new_chapters_added\": false, \"reasoning\": \"...\"}}";

pub(crate) fn story_brief(params: &StoryParameters) -> String {
    format!(
        "Theme: {}\nSetting: {}\nProtagonist: {}\nSources of conflict: {}\nIntended emotional effect: {}",
        params.theme,
        params.setting,
        params.protagonist,
        params.conflict_sources,
        params.emotional_effect
    )
}

pub(crate) fn chapter_brief(chapter: &Chapter) -> String {
    let brief = format!(
        "Chapter {}: {}\n{}",
        chapter.number, chapter.title, chapter.description
    );
    match chapter.decomposition.as_deref().map(str::trim) {
        Some(beats) if !beats.is_empty() => format!("{}\nBeats so far:\n{}", brief, beats),
        _ => brief,
    }
}

pub(crate) fn roadmap_brief(chapters: &[PlannedChapter]) -> String {
    if chapters.is_empty() {
        return "(none)".to_string();
    }
    chapters
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. {}: {}", i + 1, c.title, c.description))
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn narrator_system(
    params: &StoryParameters,
    chapter: &Chapter,
    directive: Option<&PacingDirective>,
) -> String {
    let mut system = format!(
        "{}\n\n{}\n\nCurrent chapter:\n{}",
        NARRATOR_SYSTEM,
        story_brief(params),
        chapter_brief(chapter)
    );
    if let Some(directive) = directive {
        system.push_str(&format!("\n\nNext beat: {}", directive.beat_description));
        if let Some(phase) = directive.phase {
            system.push_str(&format!("\nPhase: {}", phase));
        }
        if directive.should_transition_hint {
            system.push_str(
                "\nThe pacing editor suggests this chapter is ready to end; decide for yourself.",
            );
        }
    }
    system
}

#[cfg(test)]
mod tests {
    use super::*;
    use odyssey_core::ChapterStatus;
    use uuid::Uuid;

    fn chapter(decomposition: Option<&str>) -> Chapter {
        Chapter {
            id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            number: 2,
            title: "The Flood".into(),
            description: "The tide comes in early.".into(),
            status: ChapterStatus::Current,
            decomposition: decomposition.map(str::to_string),
        }
    }

    #[test]
    fn brief_lists_recorded_beats() {
        let brief = chapter_brief(&chapter(Some("The bell rings.\nWater floods the stair.")));
        assert!(brief.starts_with("Chapter 2: The Flood\n"));
        assert!(brief.ends_with("Beats so far:\nThe bell rings.\nWater floods the stair."));
    }

    #[test]
    fn brief_without_beats() {
        assert_eq!(
            chapter_brief(&chapter(Some("  "))),
            "Chapter 2: The Flood\nThe tide comes in early."
        );
        assert!(!chapter_brief(&chapter(None)).contains("Beats"));
    }
}
