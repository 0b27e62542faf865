extern crate std;

use soroban_sdk::{
    symbol_short,
    testutils::{Address as _, Events, Ledger},
    vec, Address, Env, IntoVal, String, Symbol, TryIntoVal,
};

use crate::events::{
    ApprovalSet, BidSubmitted, MilestoneEvent, PaymentReleased, ProjectCreated, RoleAssigned,
    UserRegistered,
};
use crate::{
    ApprovalStatus, Milestone, MilestoneMarket, MilestoneMarketClient, MilestoneStatus, Role,
    REVIEW_PERIOD_SECS,
};

fn setup() -> (Env, MilestoneMarketClient<'static>) {
    let env = Env::default();
    env.mock_all_auths();
    let contract_id = env.register(MilestoneMarket, ());
    let client = MilestoneMarketClient::new(&env, &contract_id);
    (env, client)
}

fn setup_with_init() -> (Env, MilestoneMarketClient<'static>, Address) {
    let (env, client) = setup();
    let admin = Address::generate(&env);
    client.init(&admin);
    (env, client, admin)
}

fn project_with_one_milestone(env: &Env, client: &MilestoneMarketClient, owner: &Address) -> u64 {
    let milestone = Milestone {
        id: 0,
        description: String::from_str(env, "draft"),
        deliverables: String::from_str(env, "sketches"),
        amount: 250,
        status: MilestoneStatus::Pending,
        amendment_requests: 0,
        review_deadline: None,
    };
    client.create_project(
        owner,
        &String::from_str(env, "Logo"),
        &String::from_str(env, "desc"),
        &vec![env, milestone],
        &250,
    )
}

#[test]
fn test_init_event() {
    let (env, client, admin) = setup_with_init();

    let last_event = env.events().all().last().expect("No events found");
    assert_eq!(last_event.0, client.address);
    let expected_topics = vec![&env, symbol_short!("init").into_val(&env)];
    assert_eq!(last_event.1, expected_topics);
    let data: Address = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(data, admin);
}

#[test]
fn test_user_registered_event() {
    let (env, client, _admin) = setup_with_init();
    let user = Address::generate(&env);

    client.initialize_auth(&user);

    let last_event = env.events().all().last().expect("No events found");
    let expected_topics = vec![
        &env,
        symbol_short!("user_reg").into_val(&env),
        user.into_val(&env),
    ];
    assert_eq!(last_event.1, expected_topics);
    let data: UserRegistered = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(
        data,
        UserRegistered {
            principal: user,
            role: Role::User,
        }
    );
}

#[test]
fn test_role_and_approval_events() {
    let (env, client, admin) = setup_with_init();
    let user = Address::generate(&env);

    client.assign_role(&admin, &user, &Role::Admin);
    let last_event = env.events().all().last().expect("No events found");
    let expected_topics = vec![
        &env,
        symbol_short!("role_set").into_val(&env),
        user.into_val(&env),
    ];
    assert_eq!(last_event.1, expected_topics);
    let data: RoleAssigned = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(
        data,
        RoleAssigned {
            by: admin.clone(),
            target: user.clone(),
            role: Role::Admin,
        }
    );

    client.set_approval(&admin, &user, &ApprovalStatus::Approved);
    let last_event = env.events().all().last().expect("No events found");
    let expected_topics = vec![
        &env,
        symbol_short!("appr_set").into_val(&env),
        user.into_val(&env),
    ];
    assert_eq!(last_event.1, expected_topics);
    let data: ApprovalSet = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(
        data,
        ApprovalSet {
            by: admin,
            target: user,
            status: ApprovalStatus::Approved,
        }
    );
}

#[test]
fn test_project_created_event() {
    let (env, client, admin) = setup_with_init();

    let id = project_with_one_milestone(&env, &client, &admin);

    let last_event = env.events().all().last().expect("No events found");
    assert_eq!(last_event.0, client.address);
    let expected_topics = vec![
        &env,
        symbol_short!("created").into_val(&env),
        id.into_val(&env),
    ];
    assert_eq!(last_event.1, expected_topics);
    let data: ProjectCreated = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(
        data,
        ProjectCreated {
            project_id: id,
            client: admin,
            total_amount: 250,
            milestone_count: 1,
        }
    );
}

#[test]
fn test_bid_submitted_event() {
    let (env, client, admin) = setup_with_init();
    let id = project_with_one_milestone(&env, &client, &admin);
    let provider = Address::generate(&env);
    client.initialize_auth(&provider);
    client.set_approval(&admin, &provider, &ApprovalStatus::Approved);

    client.submit_bid(
        &provider,
        &id,
        &String::from_str(&env, "3 days"),
        &String::from_str(&env, "half upfront"),
        &240,
    );

    let last_event = env.events().all().last().expect("No events found");
    let expected_topics = vec![
        &env,
        symbol_short!("bid").into_val(&env),
        id.into_val(&env),
    ];
    assert_eq!(last_event.1, expected_topics);
    let data: BidSubmitted = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(
        data,
        BidSubmitted {
            project_id: id,
            provider,
            amount: 240,
        }
    );
}

#[test]
fn test_milestone_events() {
    let (env, client, admin) = setup_with_init();
    env.ledger().set_timestamp(5_000);
    let id = project_with_one_milestone(&env, &client, &admin);

    client.complete_milestone(&admin, &id, &0);
    let last_event = env.events().all().last().expect("No events found");
    let expected_topics = vec![
        &env,
        symbol_short!("ms_done").into_val(&env),
        id.into_val(&env),
        0u64.into_val(&env),
    ];
    assert_eq!(last_event.1, expected_topics);
    let data: MilestoneEvent = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(
        data,
        MilestoneEvent {
            project_id: id,
            milestone_id: 0,
            caller: admin.clone(),
            status: MilestoneStatus::UnderReview,
            amendment_requests: 0,
            review_deadline: Some(5_000 + REVIEW_PERIOD_SECS),
        }
    );

    client.request_amendment(&admin, &id, &0);
    let last_event = env.events().all().last().expect("No events found");
    let topic: Symbol = last_event.1.get(0).unwrap().try_into_val(&env).unwrap();
    assert_eq!(topic, symbol_short!("amend"));
    let data: MilestoneEvent = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(data.status, MilestoneStatus::InProgress);
    assert_eq!(data.amendment_requests, 1);

    client.approve_milestone(&admin, &id, &0);
    let last_event = env.events().all().last().expect("No events found");
    let topic: Symbol = last_event.1.get(0).unwrap().try_into_val(&env).unwrap();
    assert_eq!(topic, symbol_short!("ms_ok"));
    let data: MilestoneEvent = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(data.status, MilestoneStatus::Approved);
}

#[test]
fn test_payment_released_event() {
    let (env, client, admin) = setup_with_init();
    let id = project_with_one_milestone(&env, &client, &admin);
    client.complete_milestone(&admin, &id, &0);
    env.ledger().set_timestamp(env.ledger().timestamp() + REVIEW_PERIOD_SECS);

    client.release_payment(&admin, &id, &0);

    let last_event = env.events().all().last().expect("No events found");
    let expected_topics = vec![
        &env,
        symbol_short!("released").into_val(&env),
        id.into_val(&env),
        0u64.into_val(&env),
    ];
    assert_eq!(last_event.1, expected_topics);
    let data: PaymentReleased = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(
        data,
        PaymentReleased {
            project_id: id,
            milestone_id: 0,
            caller: admin,
            amount: 250,
        }
    );
}

#[test]
fn test_failed_call_emits_no_event() {
    let (env, client, admin) = setup_with_init();
    let id = project_with_one_milestone(&env, &client, &admin);

    assert!(client.try_release_payment(&admin, &id, &0).is_err());

    let released = symbol_short!("released");
    for event in env.events().all().iter() {
        let topic: Symbol = event.1.get(0).unwrap().try_into_val(&env).unwrap();
        assert_ne!(topic, released);
    }
}
