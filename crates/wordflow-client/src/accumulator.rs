use crate::types::{Ask, Fragment, Role};

/// Ordered output accumulator for one run.
///
/// Each run task owns exactly one accumulator; a new start always gets a
/// fresh instance, so a late callback from an abandoned stream can never
/// touch the next run's state. Subscribers receive cloned snapshots, never a
/// live reference.
#[derive(Default)]
pub(crate) struct OutputAccumulator {
    fragments: Vec<Fragment>,
}

impl OutputAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one content frame, coalescing consecutive same-path chunks
    /// into a single fragment whose content grows monotonically.
    pub fn push_content(&mut self, path: &str, content: &str) {
        if let Some(last) = self.fragments.last_mut()
            && last.path == path
        {
            last.content.push_str(content);
            return;
        }
        self.fragments.push(Fragment {
            path: path.to_string(),
            content: content.to_string(),
            role: Role::System,
        });
    }

    /// Applies an ask frame's prompt text for display continuity: appended to
    /// the last fragment when one exists, otherwise it starts a new system
    /// fragment under the ask's own path.
    pub fn push_ask(&mut self, ask: &Ask) {
        if let Some(last) = self.fragments.last_mut() {
            last.content
                .push_str(&format!("\n\n{}\n\n", ask.content.value));
            return;
        }
        self.fragments.push(Fragment {
            path: ask.path.clone(),
            content: ask.content.value.clone(),
            role: Role::System,
        });
    }

    /// Records the user's reply to an ask so it is visible in the transcript.
    pub fn push_user_reply(&mut self, value: &str) {
        self.fragments.push(Fragment {
            path: String::new(),
            content: value.to_string(),
            role: Role::User,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Immutable copy emitted to the subscriber after each applied frame.
    pub fn snapshot(&self) -> Vec<Fragment> {
        self.fragments.clone()
    }

    pub fn into_fragments(self) -> Vec<Fragment> {
        self.fragments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ask(path: &str, value: &str) -> Ask {
        Ask {
            path: path.into(),
            content: crate::types::AskContent {
                content_type: "text".into(),
                value: value.into(),
            },
            ask_id: "ask-1".into(),
        }
    }

    #[test]
    fn consecutive_same_path_chunks_coalesce() {
        let mut acc = OutputAccumulator::new();
        acc.push_content("a", "foo");
        acc.push_content("a", "bar");
        let out = acc.snapshot();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].content, "foobar");
        assert_eq!(out[0].role, Role::System);
    }

    #[test]
    fn path_change_appends_a_new_fragment() {
        let mut acc = OutputAccumulator::new();
        acc.push_content("a", "foo");
        acc.push_content("b", "bar");
        acc.push_content("a", "baz");
        let out = acc.snapshot();
        let paths: Vec<&str> = out.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["a", "b", "a"]);
    }

    #[test]
    fn ask_prompt_appends_to_last_fragment_with_blank_lines() {
        let mut acc = OutputAccumulator::new();
        acc.push_content("a", "draft");
        acc.push_ask(&ask("q", "Approve?"));
        let out = acc.snapshot();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].content, "draft\n\nApprove?\n\n");
    }

    #[test]
    fn ask_on_empty_accumulator_starts_a_system_fragment() {
        let mut acc = OutputAccumulator::new();
        acc.push_ask(&ask("q", "Name?"));
        let out = acc.snapshot();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].path, "q");
        assert_eq!(out[0].content, "Name?");
    }

    #[test]
    fn content_after_ask_and_reply_appends_under_its_own_path() {
        let mut acc = OutputAccumulator::new();
        acc.push_content("a", "before");
        acc.push_ask(&ask("q", "More?"));
        acc.push_user_reply("yes");
        acc.push_content("a", "after");
        let out = acc.snapshot();
        assert_eq!(out.len(), 3);
        assert_eq!(out[1].role, Role::User);
        assert_eq!(out[1].path, "");
        assert_eq!(out[2].path, "a");
        assert_eq!(out[2].content, "after");
    }

    #[test]
    fn snapshot_is_detached_from_later_mutation() {
        let mut acc = OutputAccumulator::new();
        acc.push_content("a", "one");
        let snap = acc.snapshot();
        acc.push_content("a", "two");
        assert_eq!(snap[0].content, "one");
        assert_eq!(acc.snapshot()[0].content, "onetwo");
    }
}
