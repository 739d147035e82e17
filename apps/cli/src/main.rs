use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use client_core::{
    aggregate::PROGRESS_STAGES,
    engine::{BankDetails, LenderResponse},
    ClaimStore, LenderOverview,
};
use shared::{
    domain::{ActivityLogEntry, ClaimId, LenderId},
    protocol::{MailTemplate, ResponseAction},
};

mod config;

#[derive(Parser, Debug)]
#[command(name = "claims", about = "Track car-finance mis-selling claims")]
struct Cli {
    /// Claims API base URL; falls back to claims.toml / CLAIMS_API_URL.
    #[arg(long)]
    api_url: Option<String>,
    /// Bearer token; falls back to claims.toml / CLAIMS_AUTH_TOKEN.
    #[arg(long)]
    auth_token: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Lender cards with derived status and progress.
    Dashboard,
    /// One lender's agreements plus the status history panel.
    Lender { lender_id: String },
    /// Record a new agreement for a lender.
    AddAgreement {
        lender_id: String,
        agreement_number: String,
        car_registration: String,
    },
    /// Submit pending agreements to the lender.
    Submit {
        lender_id: String,
        claim_ids: Vec<String>,
        #[arg(long)]
        custom_text: Option<String>,
    },
    /// Record the lender's response to a submitted claim.
    Respond {
        claim_id: String,
        #[command(subcommand)]
        response: RespondCommand,
    },
}

#[derive(Subcommand, Debug)]
enum RespondCommand {
    /// The lender made an offer.
    Offer {
        amount: f64,
        /// Accept the offer; requires the bank detail flags.
        #[arg(long)]
        accept: bool,
        #[arg(long)]
        account_name: Option<String>,
        #[arg(long)]
        sort_code: Option<String>,
        #[arg(long)]
        account_number: Option<String>,
    },
    /// The lender rejected the claim.
    Rejected {
        /// Escalate to the Financial Ombudsman Service.
        #[arg(long)]
        escalate: bool,
    },
    /// The lender paused the claim under the FCA review.
    FcaPause,
    /// The lender says a claim already exists.
    AlreadySubmitted {
        /// Ask to take the existing claim over.
        #[arg(long)]
        take_over: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let cli = Cli::parse();

    let mut settings = config::load_settings();
    if let Some(api_url) = cli.api_url {
        settings.api_url = api_url;
    }
    if let Some(auth_token) = cli.auth_token {
        settings.auth_token = auth_token;
    }
    if settings.auth_token.is_empty() {
        bail!("no auth token configured; set CLAIMS_AUTH_TOKEN or pass --auth-token");
    }

    let store = ClaimStore::connect(settings.api_url, settings.auth_token);
    store.refresh().await?;

    match cli.command {
        Command::Dashboard => {
            for overview in store.overview().await {
                print_card(&overview);
            }
        }
        Command::Lender { lender_id } => {
            let overview = store.lender_overview(&LenderId::new(lender_id)).await?;
            print_card(&overview);
            for agreement in &overview.agreements {
                let offer = agreement
                    .offer_amount
                    .map(|amount| format!("  offer £{amount:.2}"))
                    .unwrap_or_default();
                println!(
                    "  {}  {}  {:?}{offer}",
                    agreement.agreement_number, agreement.car_registration, agreement.status
                );
            }
            print_entries("status history", &store.status_history().await);
        }
        Command::AddAgreement {
            lender_id,
            agreement_number,
            car_registration,
        } => {
            let lender_id = LenderId::new(lender_id);
            store
                .add_agreement(&lender_id, &agreement_number, &car_registration)
                .await?;
            print_card(&store.lender_overview(&lender_id).await?);
            print_entries("activity", &store.activity_log().await);
        }
        Command::Submit {
            lender_id,
            claim_ids,
            custom_text,
        } => {
            let lender_id = LenderId::new(lender_id);
            let claim_ids: Vec<ClaimId> = claim_ids.into_iter().map(ClaimId::new).collect();
            store
                .submit_claims(
                    &lender_id,
                    &claim_ids,
                    MailTemplate::ClaimSubmission,
                    custom_text,
                )
                .await?;
            print_card(&store.lender_overview(&lender_id).await?);
            print_entries("activity", &store.activity_log().await);
        }
        Command::Respond { claim_id, response } => {
            let response = build_response(response)?;
            let status = store
                .record_response(&ClaimId::new(claim_id), &response)
                .await?;
            println!("agreement now {status:?}");
            print_entries("activity", &store.activity_log().await);
        }
    }

    Ok(())
}

fn build_response(command: RespondCommand) -> Result<LenderResponse> {
    Ok(match command {
        RespondCommand::Offer {
            amount,
            accept,
            account_name,
            sort_code,
            account_number,
        } => {
            let template = if accept {
                MailTemplate::AcceptOffer
            } else {
                MailTemplate::Acknowledge
            };
            let bank_details = match (account_name, sort_code, account_number) {
                (Some(account_name), Some(sort_code), Some(account_number)) => {
                    Some(BankDetails {
                        account_name,
                        sort_code,
                        account_number,
                    })
                }
                (None, None, None) => None,
                _ => bail!("bank details need account name, sort code and account number"),
            };
            LenderResponse::Offer {
                amount,
                template,
                bank_details,
            }
        }
        RespondCommand::Rejected { escalate } => LenderResponse::Rejected {
            action: if escalate {
                ResponseAction::FosEscalation
            } else {
                ResponseAction::LeaveAsIs
            },
        },
        RespondCommand::FcaPause => LenderResponse::FcaPause,
        RespondCommand::AlreadySubmitted { take_over } => LenderResponse::AlreadySubmitted {
            want_to_take_over: take_over,
        },
    })
}

fn print_card(overview: &LenderOverview) {
    println!(
        "{}  [{}]  step {}/{} ({})  {} agreement(s)",
        overview.lender.name,
        overview.status,
        overview.step_index + 1,
        PROGRESS_STAGES.len(),
        PROGRESS_STAGES[overview.step_index],
        overview.agreements_count(),
    );
}

fn print_entries(heading: &str, entries: &[ActivityLogEntry]) {
    if entries.is_empty() {
        return;
    }
    println!("{heading}:");
    for entry in entries {
        println!(
            "  {}  {}  {}",
            entry.timestamp.format("%Y-%m-%d %H:%M"),
            entry.title,
            entry.description
        );
    }
}
