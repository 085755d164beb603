//! Appointment drafts and reference resolution
//!
//! Picking a client or service while drafting an appointment copies its name
//! (and, for services, its price) onto the draft from the rows already
//! loaded for the owner. Nothing here talks to the store.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AgendaError, AgendaResult};
use crate::models::{Client, NewAppointment, Service, non_blank};

/// An appointment being filled in
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppointmentDraft {
    pub client_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub service_name: String,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub price: Option<Decimal>,
    pub notes: Option<String>,
}

impl AppointmentDraft {
    /// Pick a client; an id missing from `clients` clears the name
    pub fn select_client(&mut self, id: Option<Uuid>, clients: &[Client]) {
        self.client_id = id;
        self.client_name = id
            .and_then(|id| clients.iter().find(|c| c.id == id))
            .map(|c| c.name.clone())
            .unwrap_or_default();
    }

    /// Pick a service; an id missing from `services` clears name and price
    pub fn select_service(&mut self, id: Option<Uuid>, services: &[Service]) {
        self.service_id = id;
        match id.and_then(|id| services.iter().find(|s| s.id == id)) {
            Some(service) => {
                self.service_name = service.name.clone();
                self.price = Some(service.price);
            }
            None => {
                self.service_name.clear();
                self.price = Some(Decimal::ZERO);
            }
        }
    }

    /// Resolve the draft's ids against loaded rows, keeping typed names
    /// when no id was picked
    pub fn resolve(mut self, clients: &[Client], services: &[Service]) -> Self {
        if self.client_id.is_some() {
            self.select_client(self.client_id, clients);
        }
        if self.service_id.is_some() {
            let typed_price = self.price;
            self.select_service(self.service_id, services);
            // A price typed over the service's list price wins
            if let Some(price) = typed_price.filter(|_| !self.service_name.is_empty()) {
                self.price = Some(price);
            }
        }
        self
    }

    pub fn validate(self) -> AgendaResult<NewAppointment> {
        let client_name = self.client_name.trim().to_string();
        if client_name.is_empty() {
            return Err(AgendaError::Validation("Client is required".to_string()));
        }
        let service_name = self.service_name.trim().to_string();
        if service_name.is_empty() {
            return Err(AgendaError::Validation("Service is required".to_string()));
        }
        let date = self
            .date
            .ok_or_else(|| AgendaError::Validation("Date is required".to_string()))?;
        let time = self
            .time
            .ok_or_else(|| AgendaError::Validation("Time is required".to_string()))?;
        let price = self
            .price
            .ok_or_else(|| AgendaError::Validation("Price is required".to_string()))?;
        if price < Decimal::ZERO {
            return Err(AgendaError::Validation("Price cannot be negative".to_string()));
        }

        Ok(NewAppointment {
            client_id: self.client_id,
            service_id: self.service_id,
            client_name,
            service_name,
            date,
            time,
            price,
            notes: non_blank(self.notes),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OwnerId;
    use chrono::Utc;

    fn client(name: &str) -> Client {
        Client {
            id: Uuid::new_v4(),
            owner_id: OwnerId(Uuid::nil()),
            name: name.to_string(),
            phone: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn service(name: &str, cents: i64) -> Service {
        Service {
            id: Uuid::new_v4(),
            owner_id: OwnerId(Uuid::nil()),
            name: name.to_string(),
            price: Decimal::new(cents, 2),
            duration_minutes: Some(30),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn complete_draft() -> AppointmentDraft {
        AppointmentDraft {
            client_name: "Ana".to_string(),
            service_name: "Haircut".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 6, 12),
            time: NaiveTime::from_hms_opt(14, 30, 0),
            price: Some(Decimal::new(5000, 2)),
            ..Default::default()
        }
    }

    #[test]
    fn selecting_copies_name_and_price() {
        let clients = vec![client("Ana"), client("Bruno")];
        let services = vec![service("Haircut", 5000)];
        let mut draft = AppointmentDraft::default();

        draft.select_client(Some(clients[1].id), &clients);
        draft.select_service(Some(services[0].id), &services);

        assert_eq!(draft.client_name, "Bruno");
        assert_eq!(draft.service_name, "Haircut");
        assert_eq!(draft.price, Some(Decimal::new(5000, 2)));
    }

    #[test]
    fn unknown_ids_clear_the_snapshot_and_block_submission() {
        let mut draft = complete_draft();
        draft.select_client(Some(Uuid::new_v4()), &[client("Ana")]);
        assert_eq!(draft.client_name, "");
        assert!(matches!(
            draft.clone().validate(),
            Err(AgendaError::Validation(_))
        ));

        let mut draft = complete_draft();
        draft.select_service(Some(Uuid::new_v4()), &[]);
        assert_eq!(draft.service_name, "");
        assert_eq!(draft.price, Some(Decimal::ZERO));
        assert!(draft.validate().is_err());
    }

    #[test]
    fn manually_typed_names_are_accepted() {
        let appointment = complete_draft().validate().unwrap();
        assert_eq!(appointment.client_id, None);
        assert_eq!(appointment.client_name, "Ana");
    }

    #[test]
    fn resolve_keeps_a_typed_price() {
        let services = vec![service("Haircut", 5000)];
        let draft = AppointmentDraft {
            service_id: Some(services[0].id),
            price: Some(Decimal::new(4500, 2)),
            ..complete_draft()
        }
        .resolve(&[], &services);

        assert_eq!(draft.service_name, "Haircut");
        assert_eq!(draft.price, Some(Decimal::new(4500, 2)));
    }

    #[test]
    fn missing_time_is_a_validation_failure() {
        let draft = AppointmentDraft {
            time: None,
            ..complete_draft()
        };
        match draft.validate() {
            Err(AgendaError::Validation(msg)) => assert_eq!(msg, "Time is required"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
