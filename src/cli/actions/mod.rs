pub mod open;
pub mod serve;

// Single dispatch point that turns an `Action` into work.
mod run;

#[derive(Debug)]
pub enum Action {
    Serve(serve::Args),
    Open(open::Args),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
