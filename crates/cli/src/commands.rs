use crate::{AskArgs, DraftArgs, ParseVerdictArgs, SubmissionArgs};
use anyhow::{Context, Result};
use policy_agent::{parse_conflict_response, Drafter, PolicyAgent, PolicySubmission};
use policy_protocol::{AnswerResponse, ConflictCheckResponse, PolicyFormData};
use serde::Serialize;
use std::io::{self, Read};
use std::path::Path;

#[derive(Clone, Copy)]
pub struct Output {
    pub json: bool,
}

impl Output {
    fn print_json<T: Serialize>(self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

pub async fn run_ask(agent: &PolicyAgent, args: AskArgs, output: Output) -> Result<()> {
    let response = agent
        .answer_query(&args.query, args.department.as_deref())
        .await?;
    if output.json {
        return output.print_json(&response);
    }
    print_answer(&response);
    Ok(())
}

pub async fn run_check_conflict(
    agent: &PolicyAgent,
    args: SubmissionArgs,
    output: Output,
) -> Result<()> {
    let submission = read_submission(&args)?;
    let response = agent.check_submission(&submission).await?;
    if output.json {
        return output.print_json(&response);
    }
    print_conflicts(&response);
    Ok(())
}

pub async fn run_upload(agent: &PolicyAgent, args: SubmissionArgs, output: Output) -> Result<()> {
    let submission = read_submission(&args)?;
    let response = agent.upload(&submission).await?;
    if output.json {
        output.print_json(&response)?;
    } else if let Some(id) = &response.policy_id {
        println!("{} ({id})", response.message);
    } else {
        eprintln!("{}", response.message);
    }
    if !response.success {
        std::process::exit(1);
    }
    Ok(())
}

pub async fn run_draft(drafter: &Drafter, args: DraftArgs, output: Output) -> Result<()> {
    let response = drafter.draft(&args.request).await?;
    if output.json {
        return output.print_json(&response);
    }
    print!("{}", response.document);
    Ok(())
}

pub fn run_parse_verdict(args: ParseVerdictArgs, output: Output) -> Result<()> {
    let text = match &args.file {
        Some(path) => read_text(path)?,
        None => read_stdin()?,
    };
    let verdict = parse_conflict_response(&text);
    if output.json {
        return output.print_json(&verdict);
    }
    println!("Conflict: {}", if verdict.has_conflict { "yes" } else { "no" });
    print_list("Conflicts", &verdict.conflicts);
    print_list("Suggestions", &verdict.suggestions);
    Ok(())
}

fn read_submission(args: &SubmissionArgs) -> Result<PolicySubmission> {
    let content = read_text(&args.content)?;
    let submission = match (&args.metadata, &args.policy_id) {
        (Some(raw), _) => {
            let form: PolicyFormData =
                serde_json::from_str(raw).context("Invalid JSON passed to --metadata")?;
            PolicySubmission::create(form, content)
        }
        (None, Some(id)) => PolicySubmission::update(id.clone(), content),
        (None, None) => anyhow::bail!("Provide either --metadata or --policy-id"),
    };

    match args.content.file_name().and_then(|n| n.to_str()) {
        Some(name) if args.content != Path::new("-") => Ok(submission.with_file_name(name)),
        _ => Ok(submission),
    }
}

fn read_text(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        return read_stdin();
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn read_stdin() -> Result<String> {
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read stdin")?;
    Ok(buffer)
}

fn print_answer(response: &AnswerResponse) {
    println!("{}", response.answer);
    if !response.sources.is_empty() {
        println!();
        println!("Sources:");
        for source in &response.sources {
            println!("  - {} ({})", source.title, source.department);
        }
    }
}

fn print_conflicts(response: &ConflictCheckResponse) {
    println!("{}", response.message);
    if let Some(conflicts) = &response.conflicts {
        print_list("Conflicts", conflicts);
    }
    if let Some(suggestions) = &response.suggestions {
        print_list("Suggestions", suggestions);
    }
}

fn print_list(title: &str, items: &[String]) {
    println!("{title}:");
    for (idx, item) in items.iter().enumerate() {
        println!("  {}. {item}", idx + 1);
    }
}
