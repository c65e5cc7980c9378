use serde::de::DeserializeOwned;
use serde::Serialize;
use slot_types::{Reception, RpcRequest, RpcResponse, ScheduleInfo, ScheduleOfDay};

use crate::config::{Config, DoctorConfig};
use crate::error::{FetchError, NOT_FOUND_CODE};

const METHOD_RECEPTIONS: &str = "getAppointmentReceptionsByPatient";
const METHOD_SCHEDULE: &str = "getAvailableResourceScheduleInfo";

/// What a schedule request produced when it did not fail
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Schedule(Vec<ScheduleOfDay>),
    Empty,
}

impl FetchOutcome {
    pub fn into_days(self) -> Vec<ScheduleOfDay> {
        match self {
            FetchOutcome::Schedule(days) => days,
            FetchOutcome::Empty => Vec::new(),
        }
    }
}

/// Client for the booking API's JSON-RPC endpoint
pub struct ScheduleClient {
    http: reqwest::Client,
    base_url: String,
    oms_number: String,
    birth_date: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PatientParams<'a> {
    oms_number: &'a str,
    birth_date: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleParams<'a> {
    appointment_id: Option<i64>,
    available_resource_id: i64,
    oms_number: &'a str,
    birth_date: &'a str,
}

/// Decoded reply, with the benign "not found" error folded into `NotFound`
enum Reply<T> {
    Result(T),
    NotFound,
}

impl ScheduleClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            oms_number: config.oms_number.clone(),
            birth_date: config.birth_date.clone(),
        })
    }

    /// Id of the patient's first existing appointment, if there is one.
    pub async fn resolve_appointment_id(&self) -> Result<Option<i64>, FetchError> {
        let params = PatientParams {
            oms_number: &self.oms_number,
            birth_date: &self.birth_date,
        };

        match self.call::<_, Vec<Reception>>(METHOD_RECEPTIONS, params).await? {
            Reply::Result(receptions) => Ok(receptions.first().map(|r| r.id)),
            Reply::NotFound => Ok(None),
        }
    }

    pub async fn fetch_schedule(
        &self,
        doctor: &DoctorConfig,
        appointment_id: Option<i64>,
    ) -> Result<FetchOutcome, FetchError> {
        let params = ScheduleParams {
            appointment_id,
            available_resource_id: doctor.resource_id,
            oms_number: &self.oms_number,
            birth_date: &self.birth_date,
        };

        match self.call::<_, ScheduleInfo>(METHOD_SCHEDULE, params).await? {
            Reply::Result(info) if !info.schedule_of_day.is_empty() => {
                Ok(FetchOutcome::Schedule(info.schedule_of_day))
            }
            Reply::Result(_) | Reply::NotFound => Ok(FetchOutcome::Empty),
        }
    }

    async fn call<P, T>(&self, method: &'static str, params: P) -> Result<Reply<T>, FetchError>
    where
        P: Serialize,
        T: DeserializeOwned,
    {
        let request = RpcRequest::new(method, params);
        tracing::debug!("Calling {} (id {})", method, request.id);

        let response = self
            .http
            .post(&self.base_url)
            .query(&[(method, "null")])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        // Error replies may come with a 4xx/5xx status but still carry a JSON-RPC body
        let decoded = serde_json::from_slice::<RpcResponse<T>>(&body);
        let reply = match decoded {
            Ok(reply) => reply,
            Err(_) if !status.is_success() => return Err(FetchError::Status { status }),
            Err(e) => return Err(FetchError::Decode(e)),
        };

        interpret(method, reply)
    }
}

fn interpret<T>(method: &str, reply: RpcResponse<T>) -> Result<Reply<T>, FetchError> {
    if let Some(result) = reply.result {
        return Ok(Reply::Result(result));
    }

    match reply.error {
        Some(error) if error.data_code() == Some(NOT_FOUND_CODE) => {
            tracing::debug!("{} returned {}", method, NOT_FOUND_CODE);
            Ok(Reply::NotFound)
        }
        Some(error) => {
            let code = error
                .data_code()
                .map(str::to_string)
                .or_else(|| error.code.map(|c| c.to_string()))
                .unwrap_or_else(|| "unknown".to_string());
            Err(FetchError::Rejected {
                code,
                message: error.describe(),
            })
        }
        None => Err(FetchError::Malformed),
    }
}
