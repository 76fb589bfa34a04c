pub type Endpoint = str;

pub const LOGIN: &Endpoint = "v2/login/autenticacao";
pub const PLANTS: &Endpoint = "v2/plantas";
pub const PLANT_DETAIL: &Endpoint = "v2/plantas/";
pub const INVERTER_DETAIL: &Endpoint = "v2/inversores/";
