//! PIN entry, reset, change and lock requests

mod common;

use std::rc::Rc;

use common::*;
use nexum_sim::RequestKind;
use nexum_sim::prelude::*;
use nexum_sim::sim_core::ValidationError;

async fn ready_session(driver: &Rc<MockDriver>) -> (Sim, Rc<MockCard>) {
    let card = Rc::new(sim_card());
    let sim = session(driver, &card);
    sim.inserted_notify(true);
    settle().await;
    (sim, card)
}

#[tokio::test]
async fn test_enter_pin_validation() {
    run_local(async {
        let driver = Rc::new(MockDriver::full());
        driver.require(PasswordKind::Pin);
        let (sim, _card) = ready_session(&driver).await;
        assert_eq!(sim.state(), SimState::Inserted);

        assert_eq!(
            sim.enter_pin(PasswordKind::Pin2, "1234").await,
            Err(SimError::InvalidFormat(ValidationError::NotAPassword(
                PasswordKind::Pin2
            )))
        );
        assert_eq!(
            sim.enter_pin(PasswordKind::None, "1234").await,
            Err(SimError::InvalidFormat(ValidationError::NotAPassword(
                PasswordKind::None
            )))
        );
        assert_eq!(
            sim.enter_pin(PasswordKind::Pin, "12a4").await,
            Err(SimError::InvalidFormat(ValidationError::InvalidCharacters))
        );
        assert_eq!(
            sim.enter_pin(PasswordKind::Pin, "123").await,
            Err(SimError::InvalidFormat(ValidationError::IncorrectLength {
                min: 4,
                max: 8,
                actual: 3
            }))
        );
        assert_eq!(driver.count("send_password"), 0);
        assert_eq!(sim.pending_request(), None);
    })
    .await;
}

#[tokio::test]
async fn test_wrong_pin_refreshes_retries() {
    run_local(async {
        let driver = Rc::new(MockDriver::full());
        driver.require(PasswordKind::Pin);
        let (sim, _card) = ready_session(&driver).await;
        let mut events = sim.subscribe();

        let err = sim.enter_pin(PasswordKind::Pin, "0000").await.unwrap_err();
        assert_eq!(
            err,
            SimError::Failed(TransportError::status_word_bytes(0x63, 0xC0))
        );
        assert!(err.is_failure());
        settle().await;

        assert_eq!(sim.state(), SimState::Inserted);
        assert_eq!(sim.properties().retries.get(&PasswordKind::Pin), Some(&2));
        let changed = properties(&drain(&mut events));
        assert!(changed.iter().any(|p| matches!(p, Property::Retries(r) if r[&PasswordKind::Pin] == 2)));
    })
    .await;
}

#[tokio::test]
async fn test_pin_escalates_to_puk_and_reset() {
    run_local(async {
        let driver = Rc::new(MockDriver::full());
        driver.require(PasswordKind::Pin);
        let (sim, _card) = ready_session(&driver).await;

        for _ in 0..3 {
            assert!(sim.enter_pin(PasswordKind::Pin, "9999").await.is_err());
        }
        settle().await;
        assert_eq!(sim.properties().pin_required, PasswordKind::Puk);
        assert_eq!(sim.properties().locked_pins, vec![PasswordKind::Pin]);

        // PIN is no longer the required kind
        assert_eq!(
            sim.enter_pin(PasswordKind::Pin, "1234").await,
            Err(SimError::InvalidFormat(ValidationError::NotAPassword(
                PasswordKind::Pin
            )))
        );
        assert_eq!(
            sim.reset_pin(PasswordKind::Puk, "12345678", "12").await,
            Err(SimError::InvalidFormat(ValidationError::IncorrectLength {
                min: 4,
                max: 8,
                actual: 2
            }))
        );
        assert_eq!(driver.count("reset_password"), 0);

        sim.reset_pin(PasswordKind::Puk, "12345678", "4321")
            .await
            .unwrap();
        settle().await;

        assert_eq!(sim.properties().pin_required, PasswordKind::None);
        assert_eq!(sim.state(), SimState::Ready);
    })
    .await;
}

#[tokio::test]
async fn test_requests_without_card() {
    run_local(async {
        let driver = Rc::new(MockDriver::full());
        let card = Rc::new(sim_card());
        let sim = session(&driver, &card);

        assert_eq!(
            sim.enter_pin(PasswordKind::Pin, "1234").await,
            Err(SimError::NotPresent)
        );
        assert_eq!(
            sim.lock_pin(PasswordKind::Pin, "1234").await,
            Err(SimError::NotPresent)
        );
        assert_eq!(
            sim.change_pin(PasswordKind::Pin, "1234", "4321").await,
            Err(SimError::NotPresent)
        );
        assert!(driver.calls().is_empty());
    })
    .await;
}

#[tokio::test]
async fn test_missing_capability() {
    run_local(async {
        let driver = Rc::new(MockDriver::new(Capabilities::new(&[
            Capability::ReadImsi,
            Capability::QueryPasswordState,
        ])));
        let (sim, _card) = ready_session(&driver).await;

        assert_eq!(
            sim.enter_pin(PasswordKind::Pin, "1234").await,
            Err(SimError::NotImplemented)
        );
        assert_eq!(
            sim.reset_pin(PasswordKind::Puk, "12345678", "1234").await,
            Err(SimError::NotImplemented)
        );
        assert_eq!(
            sim.change_pin(PasswordKind::Pin, "1234", "4321").await,
            Err(SimError::NotImplemented)
        );
        assert_eq!(
            sim.unlock_pin(PasswordKind::Pin, "1234").await,
            Err(SimError::NotImplemented)
        );
    })
    .await;
}

#[tokio::test]
async fn test_change_pin() {
    run_local(async {
        let driver = Rc::new(MockDriver::full());
        let (sim, _card) = ready_session(&driver).await;
        let queries = driver.count("query_retries");

        sim.change_pin(PasswordKind::Pin, "1234", "1234")
            .await
            .unwrap();
        assert_eq!(driver.count("change_password"), 0);

        assert_eq!(
            sim.change_pin(PasswordKind::Puk, "12345678", "87654321").await,
            Err(SimError::InvalidFormat(ValidationError::NotAPassword(
                PasswordKind::Puk
            )))
        );

        sim.change_pin(PasswordKind::Pin, "1234", "5678")
            .await
            .unwrap();
        assert_eq!(driver.count("change_password"), 1);
        assert_eq!(driver.count("query_retries"), queries + 1);

        assert!(sim
            .change_pin(PasswordKind::Pin, "1234", "4321")
            .await
            .is_err());
        assert_eq!(driver.count("query_retries"), queries + 2);
    })
    .await;
}

#[tokio::test]
async fn test_lock_and_unlock() {
    run_local(async {
        let driver = Rc::new(MockDriver::full());
        let (sim, _card) = ready_session(&driver).await;
        let mut events = sim.subscribe();

        assert_eq!(
            sim.lock_pin(PasswordKind::Pin2, "1234").await,
            Err(SimError::InvalidFormat(ValidationError::NotAPassword(
                PasswordKind::Pin2
            )))
        );
        assert_eq!(driver.count("lock"), 0);

        sim.lock_pin(PasswordKind::Pin, "1234").await.unwrap();
        assert_eq!(sim.properties().locked_pins, vec![PasswordKind::Pin]);
        assert!(
            properties(&drain(&mut events))
                .contains(&Property::LockedPins(vec![PasswordKind::Pin]))
        );

        sim.unlock_pin(PasswordKind::Pin, "1234").await.unwrap();
        assert!(sim.properties().locked_pins.is_empty());
        assert!(properties(&drain(&mut events)).contains(&Property::LockedPins(vec![])));

        let queries = driver.count("query_retries");
        assert!(sim.lock_pin(PasswordKind::Pin, "0000").await.is_err());
        assert!(sim.properties().locked_pins.is_empty());
        assert_eq!(driver.count("query_retries"), queries + 1);
        assert_eq!(sim.properties().retries.get(&PasswordKind::Pin), Some(&2));
    })
    .await;
}

#[tokio::test]
async fn test_busy_while_request_pending() {
    run_local(async {
        let driver = Rc::new(MockDriver::full());
        let (sim, card) = ready_session(&driver).await;
        let gate = card.gate(FileId::MSISDN);

        let pending = tokio::task::spawn_local({
            let sim = sim.clone();
            async move { sim.set_subscriber_numbers(&["+3581234".to_string()]).await }
        });
        settle().await;

        assert_eq!(
            sim.pending_request(),
            Some(RequestKind::SetSubscriberNumbers)
        );
        assert_eq!(
            sim.lock_pin(PasswordKind::Pin, "1234").await,
            Err(SimError::Busy)
        );
        assert_eq!(driver.count("lock"), 0);

        gate.notify_one();
        pending.await.unwrap().unwrap();
        assert_eq!(sim.pending_request(), None);
        sim.lock_pin(PasswordKind::Pin, "1234").await.unwrap();
    })
    .await;
}
