use std::io::Write;

use anyhow::Result;
use futures_util::StreamExt;

use crate::domain::SessionId;

use super::super::Container;

/// One-shot terminal chat: prints the reply as it streams.
pub struct AskController<'a> {
    container: &'a Container,
}

impl<'a> AskController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn ask<W: Write>(&self, message: &str, out: &mut W) -> Result<()> {
        let session = SessionId::generate();
        let mut replies = self
            .container
            .respond_use_case()
            .execute(&session, message, &[]);

        let mut printed = String::new();
        while let Some(snapshot) = replies.next().await {
            match snapshot.strip_prefix(printed.as_str()) {
                Some(suffix) => write!(out, "{suffix}")?,
                // Not an extension of what is on screen (an error line).
                None => write!(out, "\n{snapshot}")?,
            }
            out.flush()?;
            printed = snapshot;
        }
        writeln!(out)?;

        Ok(())
    }
}
