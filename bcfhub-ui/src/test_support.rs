//! Fixtures shared by unit tests

use bcfhub_common::Issue;

pub(crate) fn issue(archive: &str, guid: &str) -> Issue {
    Issue {
        guid: guid.to_string(),
        title: format!("Issue {}", guid),
        status: "Open".to_string(),
        priority: "Normal".to_string(),
        author: "tester".to_string(),
        created_at: "2024-01-01T00:00:00Z".to_string(),
        description: None,
        comments: Vec::new(),
        viewpoints: Vec::new(),
        snapshot: None,
        archive: archive.to_string(),
    }
}

pub(crate) fn issues(archive: &str, count: usize) -> Vec<Issue> {
    (0..count)
        .map(|i| issue(archive, &format!("{}-{}", archive, i)))
        .collect()
}
