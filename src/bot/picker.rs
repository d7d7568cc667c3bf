use anyhow::Result;
use serenity::{
    all::ButtonStyle,
    builder::{
        CreateActionRow, CreateButton, CreateInteractionResponse,
        CreateInteractionResponseMessage, EditInteractionResponse,
    },
    model::application::CommandInteraction,
    prelude::Context,
};
use std::time::Duration;
use tracing::{debug, warn};

/// Discord allows five buttons per row and five rows per message.
const MAX_BUTTONS_PER_ROW: usize = 5;
const MAX_ACTION_ROWS: usize = 5;
pub const MAX_CHOICES: usize = MAX_BUTTONS_PER_ROW * MAX_ACTION_ROWS;

const MAX_LABEL_CHARS: usize = 80;
const PICK_PREFIX: &str = "pick_";
const PICK_TIMEOUT: Duration = Duration::from_secs(60);

/// Lets the caller choose one of `items` with buttons on the deferred
/// response.
///
/// A single item is returned without asking. `None` means there was
/// nothing to choose from or nobody picked within a minute, in which case
/// the response is deleted.
pub async fn choose<T>(
    ctx: &Context,
    command: &CommandInteraction,
    mut items: Vec<T>,
    label: impl Fn(&T) -> String,
) -> Result<Option<T>> {
    if items.len() <= 1 {
        return Ok(items.pop());
    }
    items.truncate(MAX_CHOICES);

    let labels: Vec<String> = items.iter().map(&label).collect();
    command
        .edit_response(
            &ctx.http,
            EditInteractionResponse::new()
                .content("Search results")
                .components(button_rows(&labels)),
        )
        .await?;

    let message = command.get_response(&ctx.http).await?;
    let Some(component) = message
        .await_component_interaction(&ctx.shard)
        .author_id(command.user.id)
        .timeout(PICK_TIMEOUT)
        .await
    else {
        debug!("⌛ Nadie eligió un resultado para /{}", command.data.name);
        command.delete_response(&ctx.http).await?;
        return Ok(None);
    };

    let Some(index) = parse_pick(&component.data.custom_id).filter(|i| *i < items.len()) else {
        warn!("Botón desconocido: {}", component.data.custom_id);
        return Ok(None);
    };

    component
        .create_response(
            &ctx.http,
            CreateInteractionResponse::UpdateMessage(
                CreateInteractionResponseMessage::new()
                    .content(format!("Selected {}", labels[index]))
                    .components(Vec::new()),
            ),
        )
        .await?;

    Ok(Some(items.swap_remove(index)))
}

/// One secondary button per label, five to a row.
fn button_rows(labels: &[String]) -> Vec<CreateActionRow> {
    labels
        .iter()
        .take(MAX_CHOICES)
        .enumerate()
        .map(|(i, label)| {
            CreateButton::new(format!("{}{}", PICK_PREFIX, i))
                .label(truncate_label(label))
                .style(ButtonStyle::Secondary)
        })
        .collect::<Vec<_>>()
        .chunks(MAX_BUTTONS_PER_ROW)
        .map(|row| CreateActionRow::Buttons(row.to_vec()))
        .collect()
}

fn truncate_label(label: &str) -> String {
    if label.chars().count() <= MAX_LABEL_CHARS {
        return label.to_string();
    }
    let mut short: String = label.chars().take(MAX_LABEL_CHARS - 1).collect();
    short.push('…');
    short
}

fn parse_pick(custom_id: &str) -> Option<usize> {
    custom_id.strip_prefix(PICK_PREFIX)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn labels(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("Sound {}", i)).collect()
    }

    fn buttons_per_row(rows: &[CreateActionRow]) -> Vec<usize> {
        rows.iter()
            .map(|row| match row {
                CreateActionRow::Buttons(buttons) => buttons.len(),
                _ => 0,
            })
            .collect()
    }

    #[test]
    fn buttons_fill_rows_of_five() {
        assert_eq!(buttons_per_row(&button_rows(&labels(7))), vec![5, 2]);
        assert_eq!(buttons_per_row(&button_rows(&labels(5))), vec![5]);
    }

    #[test]
    fn extra_choices_are_dropped() {
        assert_eq!(buttons_per_row(&button_rows(&labels(40))), vec![5; 5]);
    }

    #[test]
    fn long_labels_are_shortened() {
        let long = "a".repeat(120);
        let short = truncate_label(&long);
        assert_eq!(short.chars().count(), MAX_LABEL_CHARS);
        assert!(short.ends_with('…'));
        assert_eq!(truncate_label("Angela_Laugh"), "Angela_Laugh");
    }

    #[test]
    fn pick_ids_round_trip_to_indices() {
        assert_eq!(parse_pick("pick_3"), Some(3));
        assert_eq!(parse_pick("pick_x"), None);
        assert_eq!(parse_pick("player_skip"), None);
    }
}
