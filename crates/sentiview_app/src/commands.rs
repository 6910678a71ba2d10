use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use sentiview_client::{
    shared_notifications, AggregateRefresher, Aggregates, ChannelPollSink, ClientSettings,
    EditController, JobApi, JobPoller, PollUpdate, QueryManager, ReqwestJobApi,
    SharedNotifications, TokenStore,
};
use sentiview_core::{JobId, MergeOutcome, NewJob, NotificationSettings, SearchQuery};
use sentiview_logging::{sv_debug, sv_info};

use crate::cli::{Cli, Command, SearchArgs};
use crate::prefs::{PrefsStore, THEMES};
use crate::render;

/// How long `edit` waits for refreshed aggregates before exiting.
const AGGREGATE_WAIT: Duration = Duration::from_secs(5);

struct App {
    api: Arc<ReqwestJobApi>,
    settings: ClientSettings,
    prefs: PrefsStore,
    notifications: SharedNotifications,
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let prefs = PrefsStore::new(&cli.state_dir);
    let mut settings = ClientSettings::from_env();
    if let Some(url) = &cli.api_url {
        settings = settings.with_base_url(url.clone());
    }

    let tokens = match prefs.load().token {
        Some(token) => TokenStore::with_token(token),
        None => TokenStore::new(),
    }
    .on_change(prefs.token_hook());
    let api = ReqwestJobApi::from_settings(settings.clone(), tokens)
        .with_context(|| format!("invalid API url {}", settings.base_url))?;
    sv_debug!("Using API at {}", settings.base_url);

    let app = App {
        api: Arc::new(api),
        settings,
        prefs,
        notifications: shared_notifications(NotificationSettings::default()),
    };

    match cli.command {
        Command::Login { username, password } => app.login(&username, &password).await,
        Command::Logout => {
            app.api.logout();
            println!("Logged out.");
            Ok(())
        }
        Command::Jobs => app.jobs().await,
        Command::Submit {
            query,
            sources,
            models,
            wait,
        } => {
            let id = app.submit(query, sources, models).await?;
            if wait {
                app.watch(id).await?;
            }
            Ok(())
        }
        Command::Watch { id } => app.watch(id).await,
        Command::Search(args) => app.search(&args).await,
        Command::Edit {
            id,
            result_id,
            score,
            reason,
        } => app.edit(id, result_id, score, &reason).await,
        Command::Theme { id } => app.theme(id.as_deref()),
    }
}

impl App {
    async fn login(&self, username: &str, password: &str) -> anyhow::Result<()> {
        self.api
            .login(username, password)
            .await
            .context("login failed")?;
        println!("Logged in as {username}.");
        Ok(())
    }

    async fn jobs(&self) -> anyhow::Result<()> {
        let jobs = self.api.list_jobs().await?;
        if jobs.is_empty() {
            println!("No analyses yet.");
        }
        for job in &jobs {
            println!("{}", render::job_line(job));
        }
        Ok(())
    }

    async fn submit(
        &self,
        query: String,
        sources: Vec<String>,
        models: Vec<String>,
    ) -> anyhow::Result<JobId> {
        let job = self
            .api
            .create_job(&NewJob::new(query, sources, models))
            .await?;
        sv_info!("Created job {}", job.id);
        println!("Created analysis #{} ({})", job.id, job.effective_status());
        Ok(job.id)
    }

    async fn watch(&self, id: JobId) -> anyhow::Result<()> {
        let poller = JobPoller::new(
            self.api.clone(),
            self.notifications.clone(),
            self.settings.poll_interval,
        );
        let (sink, mut updates) = ChannelPollSink::pair();
        let handle = poller.start(id, sink);
        self.print_notifications();

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        let outcome = loop {
            tokio::select! {
                update = updates.recv() => {
                    let Some(update) = update else {
                        break Ok(());
                    };
                    println!("{}", render::update_line(&update));
                    match update {
                        PollUpdate::Progress { .. } => continue,
                        PollUpdate::Completed(details) => {
                            print_aggregates(&Aggregates::from_details(&details));
                            break Ok(());
                        }
                        PollUpdate::JobFailed(_) => {
                            break Err(anyhow::anyhow!("analysis #{id} failed"));
                        }
                        PollUpdate::Error(err) => break Err(anyhow::Error::new(err)),
                    }
                }
                _ = &mut ctrl_c => {
                    handle.cancel();
                    println!("Stopped watching analysis #{id}.");
                    break Ok(());
                }
            }
        };

        self.print_notifications();
        outcome
    }

    async fn search(&self, args: &SearchArgs) -> anyhow::Result<()> {
        let manager = QueryManager::new(self.api.clone(), args.id, self.settings.debounce_window);
        let view = load_page(&manager, args.to_query()).await?;

        if let Some(err) = view.error {
            bail!("search failed: {}", err.user_message());
        }
        for record in &view.results.results {
            println!("{}", render::result_row(record));
        }
        println!("{}", render::page_footer(&view.results));
        Ok(())
    }

    async fn edit(
        &self,
        id: JobId,
        result_id: u64,
        score: f64,
        reason: &str,
    ) -> anyhow::Result<()> {
        let api: Arc<dyn JobApi> = self.api.clone();
        let results = Arc::new(QueryManager::new(
            api.clone(),
            id,
            self.settings.debounce_window,
        ));
        load_page(&results, SearchQuery::default()).await?;

        let aggregates = AggregateRefresher::new(api.clone(), id);
        let mut refreshed = aggregates.subscribe();
        let edits = EditController::new(api, results.clone(), aggregates);
        if !edits.begin_edit(result_id) {
            sv_debug!("Result {} is not on the first page", result_id);
        }

        match edits.commit_edit(result_id, score, reason).await {
            Ok(MergeOutcome::Merged { index }) => {
                if let Some(record) = results.view().results.results.get(index) {
                    println!("{}", render::result_row(record));
                }
            }
            Ok(MergeOutcome::NotDisplayed) => {
                println!("Saved override for result #{result_id}.");
            }
            Err(err) => bail!("override rejected: {}", err.user_message()),
        }

        if let Ok(Ok(())) = tokio::time::timeout(AGGREGATE_WAIT, refreshed.changed()).await {
            if let Some(latest) = refreshed.borrow().as_ref() {
                print_aggregates(latest);
            }
        }
        Ok(())
    }

    fn theme(&self, id: Option<&str>) -> anyhow::Result<()> {
        let Some(id) = id else {
            let current = self.prefs.load();
            for (theme_id, name) in THEMES {
                let marker = if *theme_id == current.theme() { '*' } else { ' ' };
                println!("{marker} {theme_id:<16} {name}");
            }
            return Ok(());
        };

        if !crate::prefs::is_known_theme(id) {
            bail!("unknown theme {id}; run `sentiview theme` to list them");
        }
        self.prefs.update(|prefs| prefs.theme_id = id.to_string());
        println!("Theme set to {id}.");
        Ok(())
    }

    fn print_notifications(&self) {
        let mut queue = self
            .notifications
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        queue.prune_expired();
        for notification in queue.notifications() {
            println!("{}", render::notification_line(notification));
        }
    }
}

/// Submit `query` immediately and wait for its page to be published.
async fn load_page(
    manager: &QueryManager,
    query: SearchQuery,
) -> anyhow::Result<sentiview_client::SearchView> {
    let mut view = manager.subscribe();
    manager.submit_now(query);
    let published = view
        .wait_for(|v| !v.loading)
        .await
        .context("search view closed")?
        .clone();
    Ok(published)
}

fn print_aggregates(aggregates: &Aggregates) {
    let summary = &aggregates.summary;
    let counts = &summary.sentiment_distribution;
    println!(
        "{} posts, average score {:+.2} ({} positive, {} neutral, {} negative)",
        summary.total_posts, summary.average_score, counts.positive, counts.neutral, counts.negative
    );
    let bots = &aggregates.bot_analysis;
    if bots.total > 0 {
        println!(
            "{} of {} authors look like bots (mean probability {:.0}%)",
            bots.bots,
            bots.total,
            bots.avg_bot_probability * 100.0
        );
    }
}
