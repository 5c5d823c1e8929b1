use super::print_json;
use crate::catalog::CatalogClient;
use crate::types::package::PackageKind;
use crate::types::review::{MAX_RATING, MIN_RATING, NewReview, ReviewSort};
use crate::utils::logger::Logger;
use crate::utils::spinner::run_step;
use anyhow::{Context, anyhow};

fn stars(rating: u8) -> String {
    let filled = rating.min(MAX_RATING) as usize;
    format!("{}{}", "★".repeat(filled), "☆".repeat(MAX_RATING as usize - filled))
}

pub async fn list_reviews(
    catalog: &CatalogClient,
    item_id: &str,
    sort: ReviewSort,
    limit: Option<u32>,
    json: bool,
) -> anyhow::Result<()> {
    let reviews = catalog
        .reviews(item_id, sort, limit)
        .await
        .with_context(|| format!("Failed to fetch reviews for '{}'", item_id))?;

    if json {
        return print_json(&reviews);
    }
    if reviews.is_empty() {
        Logger::new().info(&format!("No reviews for '{}' yet", item_id));
        return Ok(());
    }

    for review in reviews {
        let date = review
            .created_at
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        println!("{} {} {}", stars(review.rating), review.user_name, date);
        if let Some(comment) = review.comment.as_deref().filter(|c| !c.trim().is_empty()) {
            println!("    {}", comment);
        }
        if review.helpful_count > 0 {
            println!("    ({} found this helpful)", review.helpful_count);
        }
    }
    Ok(())
}

fn prompt_rating() -> anyhow::Result<u8> {
    let options: Vec<String> = (MIN_RATING..=MAX_RATING).rev().map(stars).collect();
    let picked = inquire::Select::new("Your rating:", options.clone())
        .prompt()
        .context("Failed to prompt for rating")?;
    let index = options
        .iter()
        .position(|o| *o == picked)
        .ok_or_else(|| anyhow!("Unknown rating selection"))?;
    Ok(MAX_RATING - index as u8)
}

fn prompt_comment() -> anyhow::Result<Option<String>> {
    let comment = inquire::Text::new("Comment (optional):")
        .with_default("")
        .prompt()
        .context("Failed to prompt for comment")?;
    Ok(Some(comment.trim().to_string()).filter(|c| !c.is_empty()))
}

/// Submits a review, prompting for whatever was not given as a flag.
pub async fn submit_review(
    catalog: &CatalogClient,
    kind: PackageKind,
    item_id: &str,
    rating: Option<u8>,
    comment: Option<String>,
    token: Option<String>,
) -> anyhow::Result<()> {
    let Some(token) = token else {
        return Err(anyhow!(
            "Submitting a review needs a session token (--token, SCRIBEPACK_TOKEN or `session` in config.toml)"
        ));
    };

    let prompted = rating.is_none();
    let rating = match rating {
        Some(r) => r,
        None => prompt_rating()?,
    };
    let comment = match comment {
        Some(c) => Some(c.trim().to_string()).filter(|c| !c.is_empty()),
        None if prompted => prompt_comment()?,
        None => None,
    };

    let review = NewReview {
        item_id: item_id.to_string(),
        item_type: kind,
        rating,
        comment,
    };

    run_step(
        "Submitting review...",
        |_: &()| format!("Review for '{}' submitted", item_id),
        catalog.submit_review(&review, Some(&token)),
    )
    .await
    .with_context(|| format!("Failed to submit review for '{}'", item_id))
}
