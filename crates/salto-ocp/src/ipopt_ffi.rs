//! Ipopt FFI bindings.
//!
//! Raw C bindings to the Ipopt C interface and to the generated
//! model-function library (objective, constraint, and derivative
//! callbacks produced by the model code generator; see `build.rs`).
//! These are wrapped by the solve path in `solver.rs`.

#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(dead_code)]

use std::ffi::CString;
use std::os::raw::{c_char, c_double, c_int, c_void};

pub type ipindex = c_int;
pub type ipnumber = c_double;
pub type ipbool = c_int;

/// C-style (0-based) sparse index numbering.
pub const INDEX_STYLE_C: ipindex = 0;

// Opaque problem handle from Ipopt
#[repr(C)]
pub struct IpoptProblemInfo {
    _private: [u8; 0],
}

pub type IpoptProblem = *mut IpoptProblemInfo;
pub type UserDataPtr = *mut c_void;

pub type Eval_F_CB = unsafe extern "C" fn(
    n: ipindex,
    x: *mut ipnumber,
    new_x: ipbool,
    obj_value: *mut ipnumber,
    user_data: UserDataPtr,
) -> ipbool;

pub type Eval_Grad_F_CB = unsafe extern "C" fn(
    n: ipindex,
    x: *mut ipnumber,
    new_x: ipbool,
    grad_f: *mut ipnumber,
    user_data: UserDataPtr,
) -> ipbool;

pub type Eval_G_CB = unsafe extern "C" fn(
    n: ipindex,
    x: *mut ipnumber,
    new_x: ipbool,
    m: ipindex,
    g: *mut ipnumber,
    user_data: UserDataPtr,
) -> ipbool;

pub type Eval_Jac_G_CB = unsafe extern "C" fn(
    n: ipindex,
    x: *mut ipnumber,
    new_x: ipbool,
    m: ipindex,
    nele_jac: ipindex,
    iRow: *mut ipindex,
    jCol: *mut ipindex,
    values: *mut ipnumber,
    user_data: UserDataPtr,
) -> ipbool;

pub type Eval_H_CB = unsafe extern "C" fn(
    n: ipindex,
    x: *mut ipnumber,
    new_x: ipbool,
    obj_factor: ipnumber,
    m: ipindex,
    lambda: *mut ipnumber,
    new_lambda: ipbool,
    nele_hess: ipindex,
    iRow: *mut ipindex,
    jCol: *mut ipindex,
    values: *mut ipnumber,
    user_data: UserDataPtr,
) -> ipbool;

extern "C" {
    // Ipopt C interface
    pub fn CreateIpoptProblem(
        n: ipindex,
        x_L: *mut ipnumber,
        x_U: *mut ipnumber,
        m: ipindex,
        g_L: *mut ipnumber,
        g_U: *mut ipnumber,
        nele_jac: ipindex,
        nele_hess: ipindex,
        index_style: ipindex,
        eval_f: Eval_F_CB,
        eval_g: Eval_G_CB,
        eval_grad_f: Eval_Grad_F_CB,
        eval_jac_g: Eval_Jac_G_CB,
        eval_h: Eval_H_CB,
    ) -> IpoptProblem;

    pub fn FreeIpoptProblem(problem: IpoptProblem);

    pub fn AddIpoptStrOption(problem: IpoptProblem, keyword: *const c_char, val: *const c_char)
        -> ipbool;
    pub fn AddIpoptNumOption(problem: IpoptProblem, keyword: *const c_char, val: ipnumber)
        -> ipbool;
    pub fn AddIpoptIntOption(problem: IpoptProblem, keyword: *const c_char, val: ipindex)
        -> ipbool;

    pub fn IpoptSolve(
        problem: IpoptProblem,
        x: *mut ipnumber,
        g: *mut ipnumber,
        obj_val: *mut ipnumber,
        mult_g: *mut ipnumber,
        mult_x_L: *mut ipnumber,
        mult_x_U: *mut ipnumber,
        user_data: UserDataPtr,
    ) -> c_int;

    // Generated model-function library (objective/constraint callbacks
    // over the multi-phase variable layout, plus sparsity metadata)
    pub fn salto_eval_f(
        n: ipindex,
        x: *mut ipnumber,
        new_x: ipbool,
        obj_value: *mut ipnumber,
        user_data: UserDataPtr,
    ) -> ipbool;
    pub fn salto_eval_grad_f(
        n: ipindex,
        x: *mut ipnumber,
        new_x: ipbool,
        grad_f: *mut ipnumber,
        user_data: UserDataPtr,
    ) -> ipbool;
    pub fn salto_eval_g(
        n: ipindex,
        x: *mut ipnumber,
        new_x: ipbool,
        m: ipindex,
        g: *mut ipnumber,
        user_data: UserDataPtr,
    ) -> ipbool;
    pub fn salto_eval_jac_g(
        n: ipindex,
        x: *mut ipnumber,
        new_x: ipbool,
        m: ipindex,
        nele_jac: ipindex,
        iRow: *mut ipindex,
        jCol: *mut ipindex,
        values: *mut ipnumber,
        user_data: UserDataPtr,
    ) -> ipbool;
    pub fn salto_eval_h(
        n: ipindex,
        x: *mut ipnumber,
        new_x: ipbool,
        obj_factor: ipnumber,
        m: ipindex,
        lambda: *mut ipnumber,
        new_lambda: ipbool,
        nele_hess: ipindex,
        iRow: *mut ipindex,
        jCol: *mut ipindex,
        values: *mut ipnumber,
        user_data: UserDataPtr,
    ) -> ipbool;

    pub fn salto_nlp_nnz_jac() -> ipindex;
    pub fn salto_nlp_nnz_hess() -> ipindex;
    pub fn salto_nlp_iteration_count() -> ipindex;
}

/// Outcome of one [`IpoptHandle::solve`] call.
#[derive(Debug, Clone, Copy)]
pub struct SolveOutcome {
    pub status: i32,
    pub objective: f64,
    pub iterations: usize,
}

/// Safe wrapper around an Ipopt problem handle.
///
/// Owns the handle for the duration of a solve and frees it on drop.
/// The evaluation callbacks come from the generated model-function
/// library and are stateless, so the handle is single-threaded by
/// construction.
pub struct IpoptHandle {
    problem: IpoptProblem,
    nb_constraints: usize,
}

impl IpoptHandle {
    /// Create a problem over the given variable/constraint bounds.
    ///
    /// Returns `None` when Ipopt rejects the dimensions.
    pub fn create(x_l: &[f64], x_u: &[f64], g_l: &[f64], g_u: &[f64]) -> Option<Self> {
        debug_assert_eq!(x_l.len(), x_u.len());
        debug_assert_eq!(g_l.len(), g_u.len());

        // Ipopt takes mutable pointers but only reads the bounds.
        let mut x_l = x_l.to_vec();
        let mut x_u = x_u.to_vec();
        let mut g_l = g_l.to_vec();
        let mut g_u = g_u.to_vec();

        let problem = unsafe {
            CreateIpoptProblem(
                x_l.len() as ipindex,
                x_l.as_mut_ptr(),
                x_u.as_mut_ptr(),
                g_l.len() as ipindex,
                g_l.as_mut_ptr(),
                g_u.as_mut_ptr(),
                salto_nlp_nnz_jac(),
                salto_nlp_nnz_hess(),
                INDEX_STYLE_C,
                salto_eval_f,
                salto_eval_g,
                salto_eval_grad_f,
                salto_eval_jac_g,
                salto_eval_h,
            )
        };

        if problem.is_null() {
            return None;
        }
        Some(Self {
            problem,
            nb_constraints: g_l.len(),
        })
    }

    pub fn set_str_option(&mut self, keyword: &str, value: &str) {
        let keyword = CString::new(keyword).expect("option keyword");
        let value = CString::new(value).expect("option value");
        unsafe {
            AddIpoptStrOption(self.problem, keyword.as_ptr(), value.as_ptr());
        }
    }

    pub fn set_num_option(&mut self, keyword: &str, value: f64) {
        let keyword = CString::new(keyword).expect("option keyword");
        unsafe {
            AddIpoptNumOption(self.problem, keyword.as_ptr(), value);
        }
    }

    pub fn set_int_option(&mut self, keyword: &str, value: i32) {
        let keyword = CString::new(keyword).expect("option keyword");
        unsafe {
            AddIpoptIntOption(self.problem, keyword.as_ptr(), value);
        }
    }

    /// Run the solver; `x` holds the initial point on entry and the
    /// solution on exit.
    pub fn solve(&mut self, x: &mut [f64]) -> SolveOutcome {
        let mut g = vec![0.0; self.nb_constraints];
        let mut objective = 0.0;

        let status = unsafe {
            IpoptSolve(
                self.problem,
                x.as_mut_ptr(),
                g.as_mut_ptr(),
                &mut objective,
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                std::ptr::null_mut(),
            )
        };

        SolveOutcome {
            status,
            objective,
            iterations: unsafe { salto_nlp_iteration_count() } as usize,
        }
    }
}

impl Drop for IpoptHandle {
    fn drop(&mut self) {
        unsafe {
            FreeIpoptProblem(self.problem);
        }
    }
}
