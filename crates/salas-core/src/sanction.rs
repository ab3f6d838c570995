//! Sanction check

use chrono::NaiveDate;
use salas_api::Sanction;
use salas_store::SanctionLedger;
use salas_util::ParticipantId;

use crate::CoreResult;

/// Whether `participant` is under a sanction covering `date` (closed interval)
pub fn is_sanctioned<L: SanctionLedger + ?Sized>(
    ledger: &L,
    participant: &ParticipantId,
    date: NaiveDate,
) -> CoreResult<bool> {
    Ok(ledger.find_active(participant, date)?.is_some())
}

/// The covering sanction of every sanctioned participant, in roster order
pub fn sanctioned_among<L: SanctionLedger + ?Sized>(
    ledger: &L,
    participants: &[ParticipantId],
    date: NaiveDate,
) -> CoreResult<Vec<Sanction>> {
    let mut hits = Vec::new();
    for participant in participants {
        if let Some(sanction) = ledger.find_active(participant, date)? {
            hits.push(sanction);
        }
    }
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use salas_store::Store;

    #[test]
    fn window_bounds_are_inclusive() {
        let store = seeded_store();
        let tx = store.begin().unwrap();
        let p = pid(STUDENT);

        tx.upsert_ignore_existing(&Sanction {
            participant: p.clone(),
            start: date("2024-03-04"),
            end: date("2024-05-04"),
        })
        .unwrap();

        assert!(!is_sanctioned(tx.as_ref(), &p, date("2024-03-03")).unwrap());
        assert!(is_sanctioned(tx.as_ref(), &p, date("2024-03-04")).unwrap());
        assert!(is_sanctioned(tx.as_ref(), &p, date("2024-05-04")).unwrap());
        assert!(!is_sanctioned(tx.as_ref(), &p, date("2024-05-05")).unwrap());
    }

    #[test]
    fn reports_only_sanctioned_participants() {
        let store = seeded_store();
        let tx = store.begin().unwrap();

        let sanction = Sanction {
            participant: pid(OTHER_STUDENT),
            start: date("2024-02-01"),
            end: date("2024-04-01"),
        };
        tx.upsert_ignore_existing(&sanction).unwrap();

        let hits = sanctioned_among(
            tx.as_ref(),
            &[pid(STUDENT), pid(OTHER_STUDENT)],
            date("2024-03-04"),
        )
        .unwrap();
        assert_eq!(hits, vec![sanction]);
    }
}
