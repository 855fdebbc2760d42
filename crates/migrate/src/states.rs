use models::{ExecutionErrorState, ExecutionErrorOption, NoDataOption, NoDataState};

/// Translate a legacy no-data option into a NoDataState.
/// Unknown options are logged and translate to NoData.
pub fn translate_no_data(option: &str) -> NoDataState {
    match NoDataOption::parse(option) {
        Some(option) => no_data_state(option),
        None => {
            let state = NoDataState::NoData;
            tracing::warn!(
                old = option,
                new = %state,
                "unable to translate legacy NoData option, using default"
            );
            state
        }
    }
}

/// Translate a legacy execution error option into an ExecutionErrorState.
/// Unknown options are logged and translate to ErrorErrState.
pub fn translate_exec_err(option: &str) -> ExecutionErrorState {
    match ExecutionErrorOption::parse(option) {
        Some(option) => exec_err_state(option),
        None => {
            let state = ExecutionErrorState::ErrorErrState;
            tracing::warn!(
                old = option,
                new = %state,
                "unable to translate legacy execution error option, using default"
            );
            state
        }
    }
}

fn no_data_state(option: NoDataOption) -> NoDataState {
    match option {
        NoDataOption::Ok => NoDataState::Ok,
        NoDataOption::NoData => NoDataState::NoData,
        NoDataOption::Alerting => NoDataState::Alerting,
        // The engine raises a dedicated DatasourceNoData alert for the NoData
        // state instead of firing the rule, which a silence then suppresses.
        NoDataOption::KeepState => NoDataState::NoData,
    }
}

fn exec_err_state(option: ExecutionErrorOption) -> ExecutionErrorState {
    match option {
        ExecutionErrorOption::Alerting => ExecutionErrorState::AlertingErrState,
        // As with NoData, the Error state raises a dedicated DatasourceError alert.
        ExecutionErrorOption::KeepState => ExecutionErrorState::ErrorErrState,
        ExecutionErrorOption::Ok => ExecutionErrorState::OkErrState,
    }
}
