use std::sync::Arc;

use crate::application::catalog::{DishService, MenuService, SubmenuService};
use crate::application::export::ExportCoordinator;
use crate::application::fixtures::FillService;

#[derive(Clone)]
pub struct ApiState {
    pub menus: Arc<MenuService>,
    pub submenus: Arc<SubmenuService>,
    pub dishes: Arc<DishService>,
    pub exports: Arc<ExportCoordinator>,
    pub fill: Arc<FillService>,
}
