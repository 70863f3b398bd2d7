use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use super::{parse_parameters, Disposition};
use crate::error::{DispatchError, DispatchResult};
use crate::tasks::{Adjustment, TaskStore};

/// Route a productivity (Aura) tool call.
///
/// `manage_burnout` stages a pending action for user confirmation rather
/// than applying it immediately; `end_call` asks the session to tear down
/// after the response is flushed.
pub fn dispatch_tasks(
    store: &mut TaskStore,
    name: &str,
    parameters: Option<Value>,
) -> DispatchResult<Disposition> {
    info!(tool = %name, "Routing task tool call");

    match name {
        "manage_burnout" => handle_manage_burnout(store, parameters),
        "end_call" => Ok(Disposition::end("Ending session. Goodbye!")),
        _ => Err(DispatchError::UnsupportedCommand {
            name: name.to_string(),
        }),
    }
}

fn handle_manage_burnout(
    store: &mut TaskStore,
    parameters: Option<Value>,
) -> DispatchResult<Disposition> {
    #[derive(Debug, Deserialize)]
    struct BurnoutParams {
        #[serde(alias = "taskId")]
        task_id: String,
        // The assistant is inconsistent about this field's name.
        #[serde(
            default,
            alias = "adjustmentType",
            alias = "new_status",
            alias = "status"
        )]
        adjustment_type: Option<String>,
    }

    let params: BurnoutParams = parse_parameters("manage_burnout", parameters)?;

    let adjustment = params
        .adjustment_type
        .as_deref()
        .map(Adjustment::from_phrase)
        .unwrap_or(Adjustment::Postpone);

    let task_name = match store.task(&params.task_id) {
        Some(task) => task.title.clone(),
        None => {
            let outcome = store.manage_burnout(&params.task_id, adjustment);
            // Not-found recovery text listing available ids; still a single
            // well-formed response so the assistant's turn completes.
            return Ok(Disposition::reply(outcome.message));
        }
    };

    store.set_pending_action(&params.task_id, adjustment);

    let verb = match adjustment {
        Adjustment::Postpone => "postpone",
        Adjustment::Cancel => "cancel",
        Adjustment::Delegate => "delegate",
        Adjustment::Complete => "complete",
    };

    Ok(Disposition::reply(format!(
        "Preparing to {} \"{}\"...",
        verb, task_name
    )))
}
