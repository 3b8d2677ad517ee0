mod common;

use sea_orm::prelude::Uuid;
use servicetrack_api::{
    access::{resolve_scope, CompanyScope, Role, UserContext},
    entities::company::CompanyType,
    services::installations::CreateInstallation,
};

use common::TestApp;

struct Hierarchy {
    app: TestApp,
    main_id: Uuid,
    distributor_id: Uuid,
    child_enduser_id: Uuid,
    assigned_enduser_id: Uuid,
    unrelated_enduser_id: Uuid,
    sales_manager_id: Uuid,
}

async fn hierarchy() -> Hierarchy {
    let app = TestApp::new().await;
    let sales_manager_id = Uuid::new_v4();

    let main = app
        .seed_company("Main GmbH", CompanyType::Main, None, None)
        .await;
    let distributor = app
        .seed_company(
            "East Distributor",
            CompanyType::Distributor,
            Some(main.id),
            None,
        )
        .await;
    let child_enduser = app
        .seed_company(
            "Mill Works",
            CompanyType::Enduser,
            Some(distributor.id),
            None,
        )
        .await;
    let assigned_enduser = app
        .seed_company(
            "Assigned Foods",
            CompanyType::Enduser,
            Some(main.id),
            Some(sales_manager_id),
        )
        .await;
    let unrelated_enduser = app
        .seed_company("Far Away Ltd", CompanyType::Enduser, None, None)
        .await;

    Hierarchy {
        app,
        main_id: main.id,
        distributor_id: distributor.id,
        child_enduser_id: child_enduser.id,
        assigned_enduser_id: assigned_enduser.id,
        unrelated_enduser_id: unrelated_enduser.id,
        sales_manager_id,
    }
}

fn user(role: Option<Role>, user_id: Uuid, company_id: Option<Uuid>) -> UserContext {
    UserContext {
        user_id,
        role,
        company_id,
    }
}

#[tokio::test]
async fn main_manager_sees_everything() {
    let h = hierarchy().await;
    let scope = resolve_scope(
        h.app.state.db.as_ref(),
        &user(Some(Role::ManagerMain), Uuid::new_v4(), None),
    )
    .await
    .unwrap();
    assert_eq!(scope, CompanyScope::Unrestricted);
}

#[tokio::test]
async fn distributor_sees_itself_and_its_children() {
    let h = hierarchy().await;
    let scope = resolve_scope(
        h.app.state.db.as_ref(),
        &user(
            Some(Role::ManagerDistributor),
            Uuid::new_v4(),
            Some(h.distributor_id),
        ),
    )
    .await
    .unwrap();

    assert!(scope.permits(h.distributor_id));
    assert!(scope.permits(h.child_enduser_id));
    assert!(!scope.permits(h.main_id));
    assert!(!scope.permits(h.unrelated_enduser_id));
}

#[tokio::test]
async fn sales_manager_sees_assigned_companies_and_their_children() {
    let h = hierarchy().await;

    // A child pointing at the assigned company is visible transitively
    let grandchild = h
        .app
        .seed_company(
            "Assigned Branch",
            CompanyType::Enduser,
            Some(h.assigned_enduser_id),
            None,
        )
        .await;

    let scope = resolve_scope(
        h.app.state.db.as_ref(),
        &user(Some(Role::SalesmanagerMain), h.sales_manager_id, None),
    )
    .await
    .unwrap();

    assert!(scope.permits(h.assigned_enduser_id));
    assert!(scope.permits(grandchild.id));
    assert!(!scope.permits(h.distributor_id));
    assert!(!scope.permits(h.unrelated_enduser_id));
}

#[tokio::test]
async fn unknown_role_sees_nothing() {
    let h = hierarchy().await;
    let scope = resolve_scope(
        h.app.state.db.as_ref(),
        &user(None, Uuid::new_v4(), Some(h.distributor_id)),
    )
    .await
    .unwrap();
    assert!(scope.is_empty());
}

#[tokio::test]
async fn distributor_without_company_header_sees_nothing() {
    let h = hierarchy().await;
    let scope = resolve_scope(
        h.app.state.db.as_ref(),
        &user(Some(Role::ServiceDistributor), Uuid::new_v4(), None),
    )
    .await
    .unwrap();
    assert!(scope.is_empty());
}

#[tokio::test]
async fn installation_listing_is_scoped_by_the_hierarchy() {
    let h = hierarchy().await;

    let item = h.app.seed_item("SCP-1", "Scoped Machine").await;
    let unit_a = h.app.seed_unit(item.id, "SN-A").await;
    let unit_b = h.app.seed_unit(item.id, "SN-B").await;

    for (unit, customer) in [
        (&unit_a, h.child_enduser_id),
        (&unit_b, h.unrelated_enduser_id),
    ] {
        h.app
            .state
            .installation_service()
            .create_installation(CreateInstallation {
                installer_id: Uuid::new_v4(),
                inventory_item_id: unit.id,
                customer_id: customer,
                setup_date: None,
                location_latitude: None,
                location_longitude: None,
                location_address: None,
                installation_notes: None,
            })
            .await
            .unwrap();
    }

    let scope = resolve_scope(
        h.app.state.db.as_ref(),
        &user(
            Some(Role::ManagerDistributor),
            Uuid::new_v4(),
            Some(h.distributor_id),
        ),
    )
    .await
    .unwrap();

    let (visible, total) = h
        .app
        .state
        .installation_service()
        .list_installations(&scope, 1, 20, None)
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].customer_id, h.child_enduser_id);

    let (all, all_total) = h
        .app
        .state
        .installation_service()
        .list_installations(&CompanyScope::Unrestricted, 1, 20, None)
        .await
        .unwrap();
    assert_eq!(all_total, 2);
    assert_eq!(all.len(), 2);
}
